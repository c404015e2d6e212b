//! Global middleware composition
//!
//! Outermost first: logging, panic recovery, error normalization. The auth
//! gate and role gates are attached per route with `route_layer` and so run
//! inside all three.

use crate::config::TelemetryConfig;
use crate::middleware::{logging::LoggingLayer, normalize_error_response, recovery_layer};
use axum::{middleware::from_fn, Router};
use tower::ServiceBuilder;

pub fn apply(router: Router, telemetry: &TelemetryConfig) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(LoggingLayer::new(telemetry.body_log_limit))
            .layer(recovery_layer())
            .layer(from_fn(normalize_error_response)),
    )
}
