//! Error response normalization middleware
//!
//! Framework-level rejections (unknown route, wrong method, malformed JSON)
//! come back as text/plain. This rewrites them into the `{status, message}`
//! envelope so clients never see parser internals.

use crate::error::ErrorResponse;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

pub async fn normalize_error_response(request: Request<Body>, next: Next) -> Response {
    let probe = matches!(request.uri().path(), "/health" | "/ready");
    let response = next.run(request).await;

    let status = response.status();
    if probe || !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    if is_json {
        return response;
    }

    envelope(status)
}

fn envelope(status: StatusCode) -> Response {
    let message = match status {
        StatusCode::BAD_REQUEST => "Invalid request body",
        StatusCode::UNAUTHORIZED => "Unauthorized, please re login!",
        StatusCode::FORBIDDEN => "You are not authorized to perform this action!",
        StatusCode::NOT_FOUND => "Not found",
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed",
        StatusCode::PAYLOAD_TOO_LARGE => "Request body too large",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "Unsupported content type",
        StatusCode::UNPROCESSABLE_ENTITY => "Invalid request body",
        _ if status.is_client_error() => "Client error",
        _ => "Internal server error",
    };

    // Body deserialization failures surface as 400 like every other input error.
    let status = if status == StatusCode::UNPROCESSABLE_ENTITY {
        StatusCode::BAD_REQUEST
    } else {
        status
    };

    (status, Json(ErrorResponse::new(status, message))).into_response()
}
