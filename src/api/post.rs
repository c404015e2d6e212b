//! Post API handlers

use crate::api::{Envelope, Pagination};
use crate::domain::{CreatePostInput, PaginationMeta, Post, PostScopeQuery};
use crate::error::Result;
use crate::middleware::{Principal, RequestContext};
use crate::state::HasServices;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostsPayload {
    pub posts: Vec<Post>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPayload {
    pub post: Post,
}

/// List posts of one of the caller's projects (`?project_id=` is required)
pub async fn list<S: HasServices>(
    State(state): State<S>,
    principal: Principal,
    Query(scope): Query<PostScopeQuery>,
    Pagination(spec): Pagination,
) -> Result<impl IntoResponse> {
    let page = state
        .post_service()
        .list(principal.user_id, scope.project_id, &spec)
        .await?;
    Ok(Envelope::ok(
        "Success",
        PostsPayload {
            posts: page.data,
            pagination: page.pagination,
        },
    ))
}

/// Create a post; the project's webhook, if any, is notified in the background
pub async fn create<S: HasServices>(
    State(state): State<S>,
    ctx: RequestContext,
    principal: Principal,
    Json(input): Json<CreatePostInput>,
) -> Result<impl IntoResponse> {
    let post = state
        .post_service()
        .create(principal.user_id, ctx.request_id(), input)
        .await?;
    Ok(Envelope::ok("Success add post", PostPayload { post }))
}
