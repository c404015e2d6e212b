//! Post endpoint tests

use super::{build_test_router, get_json, ids, post_json, TestAppState};
use axum::{body::Body, http::Request, http::StatusCode};
use logstream_core::domain::{Post, WebhookProvider};
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;

fn post_body(project_id: i64) -> serde_json::Value {
    json!({
        "project_id": project_id,
        "title": "v1.4.0",
        "content": "Exports are twice as fast",
        "category": "feature",
        "status": "published"
    })
}

#[tokio::test]
async fn test_create_post_fires_one_webhook_event() {
    let (state, publisher) = TestAppState::new();
    let project = state
        .seed_project(7, "mobile", Some("https://discord.test/api/webhooks/1"))
        .await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/posts")
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .header("x-request-id", "release-42")
        .body(Body::from(post_body(project.id).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].provider, WebhookProvider::Discord);
    assert_eq!(events[0].target_url, "https://discord.test/api/webhooks/1");
    assert_eq!(events[0].request_id.as_str(), "release-42");
    assert_eq!(events[0].post.title, "v1.4.0");
}

#[tokio::test]
async fn test_create_post_without_webhook_publishes_nothing() {
    let (state, publisher) = TestAppState::new();
    let project = state.seed_project(7, "mobile", None).await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, json) = post_json(&app, "/posts", Some(&token), post_body(project.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Success add post");
    assert_eq!(json["post"]["project_id"], project.id);
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn test_create_post_under_foreign_project() {
    let (state, publisher) = TestAppState::new();
    let project = state
        .seed_project(8, "theirs", Some("https://discord.test/api/webhooks/1"))
        .await;
    let posts = state.post_repo.clone();
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, _) = post_json(&app, "/posts", Some(&token), post_body(project.id)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(posts.count().await, 0);
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn test_create_post_validation() {
    let (state, _) = TestAppState::new();
    let project = state.seed_project(7, "mobile", None).await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let mut body = post_body(project.id);
    body["title"] = json!("");
    let (status, json) = post_json(&app, "/posts", Some(&token), body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "title is required (max 255 characters)");
}

#[tokio::test]
async fn test_list_requires_project_id() {
    let (state, _) = TestAppState::new();
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, json) = get_json(&app, "/posts?page=1&page_size=10", Some(&token)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "project_id is required");
}

#[tokio::test]
async fn test_search_all_over_title_and_category() {
    let (state, _) = TestAppState::new();
    let project = state.seed_project(7, "mobile", None).await;
    let other = state.seed_project(7, "web", None).await;
    let rows = [
        (project.id, "Foo exporter", "feature"),
        (project.id, "Bug bash", "fix"),
        (project.id, "Dark mode", "FOOTER"),
        (other.id, "Foo elsewhere", "feature"),
    ];
    for (project_id, title, category) in rows {
        state
            .post_repo
            .add_post(Post {
                project_id,
                title: title.to_string(),
                category: category.to_string(),
                ..Default::default()
            })
            .await;
    }
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let path = format!(
        "/posts?project_id={}&page=1&page_size=10&search_all=foo",
        project.id
    );
    let (status, json) = get_json(&app, &path, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json, "posts"), vec![1, 3]);
    assert_eq!(json["pagination"]["total_data"], 2);
}

#[tokio::test]
async fn test_list_field_search_and_order() {
    let (state, _) = TestAppState::new();
    let project = state.seed_project(7, "mobile", None).await;
    for title in ["alpha", "beta", "alphabet"] {
        state
            .post_repo
            .add_post(Post {
                project_id: project.id,
                title: title.to_string(),
                ..Default::default()
            })
            .await;
    }
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let path = format!(
        "/posts?project_id={}&page=1&page_size=10&search_field=title&search_value=alpha&order_by=title&sort=desc",
        project.id
    );
    let (status, json) = get_json(&app, &path, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json, "posts"), vec![3, 1]);
}
