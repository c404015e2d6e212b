//! Request/response logging stage
//!
//! Implemented as a Tower Layer/Service so it can sit outside every other
//! stage and observe the final status code. Per request it:
//! - resolves `X-Request-ID` (or generates one) and attaches a
//!   [`RequestContext`] to the request extensions,
//! - logs one line for the request (bodies capped, GETs log the query),
//! - logs one line for the response once its body has been streamed.

use crate::error::ErrorResponse;
use crate::middleware::context::{RequestContext, REQUEST_ID_HEADER};
use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use axum::{body::HttpBody, BoxError};
use http_body_util::BodyExt;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};
use tracing::{Instrument, Span};

/// Largest request body the stage will buffer before handing it on.
const MAX_BUFFERED_BODY: usize = 2 * 1024 * 1024;

/// Query parameter names whose values must be redacted in logs.
const SENSITIVE_PARAMS: &[&str] = &[
    "access_token",
    "token",
    "refresh_token",
    "password",
    "secret",
    "api_key",
];

#[derive(Clone)]
pub struct LoggingLayer {
    body_limit: usize,
}

impl LoggingLayer {
    /// `body_limit` caps how many body bytes end up in a single log line.
    pub fn new(body_limit: usize) -> Self {
        Self { body_limit }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddleware {
            inner,
            body_limit: self.body_limit,
        }
    }
}

#[derive(Clone)]
pub struct LoggingMiddleware<S> {
    inner: S,
    body_limit: usize,
}

impl<S, ResBody> Service<Request<Body>> for LoggingMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let start = Instant::now();
        let ctx = RequestContext::ensure(&mut request);
        let method = request.method().clone();
        let target = sanitize_uri(request.uri());
        let limit = self.body_limit;

        // The clone that was driven to readiness must be the one we call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let span = tracing::info_span!("request", request_id = %ctx.request_id());

        Box::pin(
            async move {
                let buffered = if method == Method::GET || method == Method::HEAD {
                    tracing::info!(method = %method, path = %target, "Request received");
                    Ok(request)
                } else {
                    buffer_request(request, &method, &target, limit).await
                };

                let (mut parts, body) = match buffered {
                    Ok(request) => {
                        let (parts, body) = inner.call(request).await?.into_parts();
                        (parts, Body::new(body))
                    }
                    Err(response) => response.into_parts(),
                };

                if let Ok(value) = HeaderValue::from_str(ctx.request_id().as_str()) {
                    parts.headers.insert(REQUEST_ID_HEADER, value);
                }

                let mut capture = CapturedResponse {
                    method,
                    target,
                    status: parts.status,
                    start,
                    limit,
                    body: Vec::new(),
                    total_len: 0,
                    span: Span::current(),
                };
                let body = body.map_frame(move |frame| {
                    if let Some(data) = frame.data_ref() {
                        capture.push(data);
                    }
                    frame
                });

                Ok(Response::from_parts(parts, Body::new(body)))
            }
            .instrument(span),
        )
    }
}

/// Buffer a request body, log a capped preview of it and rebuild the request
/// with the full body.
async fn buffer_request(
    request: Request<Body>,
    method: &Method,
    target: &str,
    limit: usize,
) -> Result<Request<Body>, Response> {
    let (parts, body) = request.into_parts();
    match axum::body::to_bytes(body, MAX_BUFFERED_BODY).await {
        Ok(bytes) => {
            tracing::info!(
                method = %method,
                path = %target,
                body = %preview(&bytes, bytes.len(), limit),
                "Request received"
            );
            Ok(Request::from_parts(parts, Body::from(bytes)))
        }
        Err(e) => {
            tracing::warn!(method = %method, path = %target, error = %e, "Request body unreadable");
            let status = StatusCode::PAYLOAD_TOO_LARGE;
            Err((
                status,
                Json(ErrorResponse::new(status, "Request body too large")),
            )
                .into_response())
        }
    }
}

/// Side-channel copy of a response body.
///
/// Frames pass through untouched; at most `limit` bytes are kept. The
/// response line is written when the body is dropped, which happens after the
/// last frame was sent or when the client went away mid-stream.
struct CapturedResponse {
    method: Method,
    target: String,
    status: StatusCode,
    start: Instant,
    limit: usize,
    body: Vec<u8>,
    total_len: usize,
    span: Span,
}

impl CapturedResponse {
    fn push(&mut self, data: &Bytes) {
        self.total_len += data.len();
        let room = self.limit.saturating_sub(self.body.len());
        self.body.extend_from_slice(&data[..data.len().min(room)]);
    }
}

impl Drop for CapturedResponse {
    fn drop(&mut self) {
        let _entered = self.span.enter();
        let latency_ms = self.start.elapsed().as_millis() as u64;
        let body = preview(&self.body, self.total_len, self.limit);

        if self.status.is_server_error() {
            tracing::warn!(
                method = %self.method,
                path = %self.target,
                status = self.status.as_u16(),
                latency_ms,
                body = %body,
                "Response sent"
            );
        } else {
            tracing::info!(
                method = %self.method,
                path = %self.target,
                status = self.status.as_u16(),
                latency_ms,
                body = %body,
                "Response sent"
            );
        }
    }
}

/// Lossy UTF-8 rendering of at most `limit` bytes, marking truncation.
fn preview(bytes: &[u8], total_len: usize, limit: usize) -> String {
    let shown = &bytes[..bytes.len().min(limit)];
    let mut text = String::from_utf8_lossy(shown).into_owned();
    if total_len > shown.len() {
        text.push_str(&format!("...[truncated {} bytes]", total_len - shown.len()));
    }
    text
}

/// Path plus a query string rebuilt with sensitive values redacted.
///
/// Example: `/projects?page=1&token=eyJhbG...` becomes
/// `/projects?page=1&token=[REDACTED]`
fn sanitize_uri(uri: &Uri) -> String {
    let query = match uri.query() {
        Some(q) if !q.is_empty() => q,
        _ => return uri.path().to_string(),
    };

    let sanitized_pairs: Vec<String> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if SENSITIVE_PARAMS.contains(&key.to_ascii_lowercase().as_str()) => {
                format!("{key}=[REDACTED]")
            }
            _ => pair.to_string(),
        })
        .collect();

    format!("{}?{}", uri.path(), sanitized_pairs.join("&"))
}
