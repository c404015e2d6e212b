//! Project API handlers

use crate::api::{Envelope, MessageResponse, Pagination};
use crate::domain::{CheckSlugQuery, PaginationMeta, Project, ProjectInput};
use crate::error::Result;
use crate::middleware::Principal;
use crate::state::HasServices;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsPayload {
    pub projects: Vec<Project>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPayload {
    pub project: Project,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlugPayload {
    pub exists: bool,
}

/// List the caller's projects
pub async fn list<S: HasServices>(
    State(state): State<S>,
    principal: Principal,
    Pagination(spec): Pagination,
) -> Result<impl IntoResponse> {
    let page = state.project_service().list(principal.user_id, &spec).await?;
    Ok(Envelope::ok(
        "Success",
        ProjectsPayload {
            projects: page.data,
            pagination: page.pagination,
        },
    ))
}

pub async fn create<S: HasServices>(
    State(state): State<S>,
    principal: Principal,
    Json(input): Json<ProjectInput>,
) -> Result<impl IntoResponse> {
    let project = state
        .project_service()
        .create(principal.user_id, input)
        .await?;
    Ok(Envelope::ok("Success add project", ProjectPayload { project }))
}

pub async fn check_slug<S: HasServices>(
    State(state): State<S>,
    Query(query): Query<CheckSlugQuery>,
) -> Result<impl IntoResponse> {
    let exists = state.project_service().check_slug(query).await?;
    Ok(Envelope::ok("Success", SlugPayload { exists }))
}

pub async fn get<S: HasServices>(
    State(state): State<S>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let project = state.project_service().get(principal.user_id, id).await?;
    Ok(Envelope::ok("Success", ProjectPayload { project }))
}

pub async fn update<S: HasServices>(
    State(state): State<S>,
    principal: Principal,
    Path(id): Path<i64>,
    Json(input): Json<ProjectInput>,
) -> Result<impl IntoResponse> {
    let project = state
        .project_service()
        .update(principal.user_id, id, input)
        .await?;
    Ok(Envelope::ok("Success update project", ProjectPayload { project }))
}

pub async fn delete<S: HasServices>(
    State(state): State<S>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.project_service().delete(principal.user_id, id).await?;
    Ok(MessageResponse::ok("Success delete project"))
}
