//! REST API shared utilities (response envelope, pagination extractor)

pub mod admin;
pub mod auth;
pub mod health;
pub mod post;
pub mod project;

use crate::domain::{PaginationQuery, PaginationSpec};
use crate::error::AppError;
use axum::{
    extract::{FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

/// Success response wrapper: `{status, message, ...payload}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: String,
    #[serde(flatten)]
    pub payload: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(message: impl Into<String>, payload: T) -> Json<Self> {
        Json(Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            payload,
        })
    }
}

/// Message-only body for operations that return nothing else
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub status: u16,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
        })
    }
}

/// Validated pagination parameters taken from the query string.
///
/// Missing `page`/`page_size` and non-numeric values are rejected with 400
/// before the handler runs.
#[derive(Debug, Clone)]
pub struct Pagination(pub PaginationSpec);

impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PaginationQuery>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(Pagination(PaginationSpec::try_from(query)?))
    }
}
