//! Per-request context: request id and authenticated principal
//!
//! The logging stage creates one [`RequestContext`] per request and stores it
//! in the request extensions. The auth gate sets the [`Principal`] exactly
//! once; everything downstream only reads it.

use crate::error::AppError;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Request},
};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id, taken from `X-Request-ID` or generated as a UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestId(Arc<str>);

impl RequestId {
    pub fn generate() -> Self {
        Self(Arc::from(Uuid::new_v4().to_string()))
    }

    /// Use the inbound header value when present and non-blank.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(id) if !id.is_empty() => Self(Arc::from(id)),
            _ => Self::generate(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated caller identity derived from verified token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    principal: Arc<OnceLock<Principal>>,
}

impl RequestContext {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            principal: Arc::new(OnceLock::new()),
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.get()
    }

    /// Attach the caller's identity. Fails if an identity is already attached.
    pub fn authenticate(&self, principal: Principal) -> Result<(), AppError> {
        self.principal.set(principal).map_err(|_| {
            AppError::Internal(anyhow::anyhow!(
                "principal already set for request {}",
                self.request_id
            ))
        })
    }

    /// The context already attached to `request`, or a fresh one attached now.
    pub fn ensure<B>(request: &mut Request<B>) -> RequestContext {
        if let Some(ctx) = request.extensions().get::<RequestContext>() {
            return ctx.clone();
        }
        let header = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok());
        let ctx = RequestContext::new(RequestId::from_header(header));
        request.extensions_mut().insert(ctx.clone());
        ctx
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("request context missing")))
    }
}

/// Handlers taking a `Principal` only run for authenticated callers.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.principal().cloned())
            .ok_or_else(|| AppError::Unauthorized("Unauthorized, please re login!".to_string()))
    }
}
