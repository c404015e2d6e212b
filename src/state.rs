//! Application state trait for dependency injection
//!
//! Handlers are generic over [`HasServices`] so the same router serves the
//! production `AppState` and the in-memory state used by integration tests.

use crate::config::Config;
use crate::jwt::JwtManager;
use crate::repository::{PostRepository, ProjectRepository, UserRepository};
use crate::service::{AuthService, PostService, ProjectService, UserService};

pub trait HasServices: Clone + Send + Sync + 'static {
    type UserRepo: UserRepository;
    type ProjectRepo: ProjectRepository;
    type PostRepo: PostRepository;

    fn config(&self) -> &Config;

    fn jwt_manager(&self) -> &JwtManager;

    fn auth_service(&self) -> &AuthService<Self::UserRepo>;

    fn project_service(&self) -> &ProjectService<Self::ProjectRepo>;

    fn post_service(&self) -> &PostService<Self::PostRepo, Self::ProjectRepo>;

    fn user_service(&self) -> &UserService<Self::UserRepo>;

    /// Whether the backing store answers.
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}
