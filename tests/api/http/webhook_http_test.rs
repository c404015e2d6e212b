//! End-to-end webhook delivery through the real dispatcher

use super::{build_test_router, post_json, TestAppState};
use axum::http::StatusCode;
use logstream_core::config::WebhookConfig;
use logstream_core::service::WebhookDispatcher;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_discord_embed_delivered_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/1"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (dispatcher, supervisor) = WebhookDispatcher::start(&WebhookConfig::default());
    let state = TestAppState::with_publisher(Arc::new(dispatcher));
    let hook = format!("{}/api/webhooks/1", server.uri());
    let project = state.seed_project(7, "mobile", Some(&hook)).await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, _) = post_json(
        &app,
        "/posts",
        Some(&token),
        json!({
            "project_id": project.id,
            "title": "v2.0.0",
            "content": "https://logstream.io/changelog/v2",
            "category": "release",
            "status": "published"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Shutdown drains pending deliveries within the grace period.
    assert_eq!(supervisor.shutdown().await, 0);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let embed = &body["embeds"][0];
    assert_eq!(embed["title"], "v2.0.0");
    assert_eq!(embed["color"], 5814783);
}

#[tokio::test]
async fn test_failing_receiver_does_not_affect_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (dispatcher, supervisor) = WebhookDispatcher::start(&WebhookConfig::default());
    let state = TestAppState::with_publisher(Arc::new(dispatcher));
    let project = state.seed_project(7, "mobile", Some(&server.uri())).await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, json) = post_json(
        &app,
        "/posts",
        Some(&token),
        json!({"project_id": project.id, "title": "t", "content": "c"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["post"]["title"], "t");
    assert_eq!(supervisor.shutdown().await, 0);
}

#[tokio::test]
async fn test_slow_receiver_does_not_delay_post_creation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/slow"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;

    let config = WebhookConfig {
        timeout_secs: 10,
        drain_grace_secs: 10,
    };
    let (dispatcher, supervisor) = WebhookDispatcher::start(&config);
    let state = TestAppState::with_publisher(Arc::new(dispatcher));
    let hook = format!("{}/api/webhooks/slow", server.uri());
    let project = state.seed_project(7, "mobile", Some(&hook)).await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let started = Instant::now();
    let (status, json) = tokio::time::timeout(
        Duration::from_secs(1),
        post_json(
            &app,
            "/posts",
            Some(&token),
            json!({"project_id": project.id, "title": "v3.0.0", "content": "c"}),
        ),
    )
    .await
    .expect("post creation waited on webhook delivery");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["post"]["title"], "v3.0.0");
    assert!(started.elapsed() < Duration::from_secs(1));

    // The delivery is still in flight; draining lets it finish.
    assert_eq!(supervisor.shutdown().await, 0);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["embeds"][0]["title"], "v3.0.0");
}
