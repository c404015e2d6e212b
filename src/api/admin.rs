//! Administrator endpoints

use crate::api::{Envelope, Pagination};
use crate::domain::{PaginationMeta, User};
use crate::error::Result;
use crate::state::HasServices;
use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersPayload {
    pub users: Vec<User>,
    pub pagination: PaginationMeta,
}

/// List registered users. Routed behind the admin role gate.
pub async fn list_users<S: HasServices>(
    State(state): State<S>,
    Pagination(spec): Pagination,
) -> Result<impl IntoResponse> {
    let page = state.user_service().list(&spec).await?;
    Ok(Envelope::ok(
        "Success",
        UsersPayload {
            users: page.data,
            pagination: page.pagination,
        },
    ))
}
