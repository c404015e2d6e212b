//! Bearer token authentication and role gates
//!
//! `authenticate` verifies the token and attaches a [`Principal`] to the
//! request context. `require_admin` / `require_non_admin` only read that
//! principal, so they must be layered inside `authenticate`:
//!
//! ```ignore
//! Router::new()
//!     .route("/admin/users", get(list_users))
//!     .route_layer(from_fn(require_admin))
//!     .route_layer(from_fn_with_state(auth_state, authenticate));
//! ```

use crate::error::ErrorResponse;
use crate::jwt::JwtManager;
use crate::middleware::context::{Principal, RequestContext};
use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

const REAUTHENTICATE: &str = "Unauthorized, please re login!";
const NOT_PERMITTED: &str = "You are not authorized to perform this action!";

/// Shared state for the authentication middleware
#[derive(Clone)]
pub struct AuthState {
    jwt_manager: JwtManager,
}

impl AuthState {
    pub fn new(jwt_manager: JwtManager) -> Self {
        Self { jwt_manager }
    }
}

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No usable `Authorization: Bearer` header
    MissingToken,
    /// Signature, expiry or claim shape rejected
    InvalidToken,
    /// Role gate reached without an authenticated principal
    NotAuthenticated,
    /// Principal present but its role does not match the route
    Forbidden,
    /// The request already carried a principal
    AlreadyAuthenticated,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing Authorization Header"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid Token"),
            AuthError::NotAuthenticated => (StatusCode::UNAUTHORIZED, REAUTHENTICATE),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, NOT_PERMITTED),
            AuthError::AlreadyAuthenticated => {
                tracing::error!("Auth gate applied twice to the same request");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(ErrorResponse::new(status, message))).into_response()
    }
}

/// Extract the Bearer token from the Authorization header
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MissingToken)?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MissingToken),
    }
}

/// Auth gate: rejects the request with 401 unless it carries a valid token.
pub async fn authenticate(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer_token(request.headers()) {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };

    let claims = match auth_state.jwt_manager.verify_session_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return AuthError::InvalidToken.into_response();
        }
    };

    let ctx = RequestContext::ensure(&mut request);
    let principal = Principal {
        user_id: claims.user_id,
        email: claims.email,
        is_admin: claims.is_admin,
    };
    if ctx.authenticate(principal).is_err() {
        return AuthError::AlreadyAuthenticated.into_response();
    }

    next.run(request).await
}

/// Role gate: only administrators pass.
pub async fn require_admin(request: Request<Body>, next: Next) -> Response {
    match check_role(&request, true) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// Role gate: only regular (non-admin) users pass.
pub async fn require_non_admin(request: Request<Body>, next: Next) -> Response {
    match check_role(&request, false) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

fn check_role(request: &Request<Body>, admin: bool) -> Result<(), AuthError> {
    let principal = request
        .extensions()
        .get::<RequestContext>()
        .and_then(|ctx| ctx.principal())
        .ok_or(AuthError::NotAuthenticated)?;

    if principal.is_admin == admin {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
