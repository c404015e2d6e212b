//! User administration

use crate::domain::{Page, PaginationSpec, User};
use crate::error::Result;
use crate::repository::UserRepository;
use std::sync::Arc;

pub struct UserService<U: UserRepository> {
    user_repo: Arc<U>,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn list(&self, spec: &PaginationSpec) -> Result<Page<User>> {
        self.user_repo.list(spec).await
    }
}
