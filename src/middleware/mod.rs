//! HTTP middleware for LogStream Core
//!
//! - Request context (request id + principal) carried in request extensions
//! - Request/response logging with body capture
//! - Panic recovery
//! - Bearer token authentication and role gates
//! - Error response normalization

pub mod auth;
pub mod context;
pub mod error_response;
pub mod logging;
pub mod pipeline;
pub mod recovery;

pub use auth::{authenticate, require_admin, require_non_admin, AuthError, AuthState};
pub use context::{Principal, RequestContext, RequestId};
pub use error_response::normalize_error_response;
pub use logging::LoggingLayer;
pub use recovery::recovery_layer;
