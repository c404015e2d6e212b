//! Project endpoint tests

use super::{build_test_router, delete_json, get_json, ids, post_json, put_json, TestAppState};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

fn project_body(slug: &str) -> serde_json::Value {
    json!({
        "name": "Mobile App",
        "slug": slug,
        "webhook_provider": "discord",
        "webhook_url": "https://discord.test/api/webhooks/1"
    })
}

#[tokio::test]
async fn test_missing_token_never_reaches_handler() {
    let (state, _) = TestAppState::new();
    let projects = state.project_repo.clone();
    let app = build_test_router(state);

    let (status, json) = post_json(&app, "/projects", None, project_body("mobile")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Missing Authorization Header");
    assert_eq!(projects.count().await, 0);
}

#[tokio::test]
async fn test_forged_token_rejected() {
    let (state, _) = TestAppState::new();
    let app = build_test_router(state);
    let forged = "eyJhbGciOiJIUzI1NiJ9.eyJ1c2VyX2lkIjoxLCJleHAiOjF9.invalid";

    let (status, json) = get_json(&app, "/projects?page=1&page_size=10", Some(forged)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid Token");
}

#[tokio::test]
async fn test_create_and_get_project() {
    let (state, _) = TestAppState::new();
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, json) = post_json(&app, "/projects", Some(&token), project_body("mobile")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Success add project");
    assert_eq!(json["project"]["user_id"], 7);
    assert_eq!(json["project"]["webhook_provider"], "discord");
    let id = json["project"]["id"].as_i64().unwrap();

    let (status, json) = get_json(&app, &format!("/projects/{id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["slug"], "mobile");
}

#[tokio::test]
async fn test_admin_cannot_create_project() {
    let (state, _) = TestAppState::new();
    let token = state.token_for(1, true);
    let projects = state.project_repo.clone();
    let app = build_test_router(state);

    let (status, json) = post_json(&app, "/projects", Some(&token), project_body("mobile")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["status"], 403);
    assert_eq!(projects.count().await, 0);
}

#[tokio::test]
async fn test_duplicate_slug_conflicts() {
    let (state, _) = TestAppState::new();
    state.seed_project(3, "mobile", None).await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, json) = post_json(&app, "/projects", Some(&token), project_body("mobile")).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "Slug already registered");
}

#[tokio::test]
async fn test_check_slug() {
    let (state, _) = TestAppState::new();
    state.seed_project(3, "mobile", None).await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, json) = get_json(&app, "/projects/check-slug?slug=mobile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["exists"], true);

    let (_, json) = get_json(&app, "/projects/check-slug?slug=web", Some(&token)).await;
    assert_eq!(json["exists"], false);
}

#[tokio::test]
async fn test_second_page_of_twenty_five() {
    let (state, _) = TestAppState::new();
    for n in 1..=25 {
        state.seed_project(7, &format!("project-{n:02}"), None).await;
    }
    // Someone else's project never shows up in the caller's listing.
    state.seed_project(8, "foreign", None).await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, json) = get_json(
        &app,
        "/projects?page=2&page_size=10&order_by=id&sort=ASC",
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json, "projects"), (11..=20).collect::<Vec<i64>>());
    assert_eq!(
        json["pagination"],
        json!({"page": 2, "page_size": 10, "total_page": 3, "total_data": 25})
    );
}

#[tokio::test]
async fn test_adjacent_pages_are_disjoint_and_stable() {
    let (state, _) = TestAppState::new();
    for n in 1..=7 {
        state.seed_project(7, &format!("p{n}"), None).await;
    }
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let mut seen = Vec::new();
    for page in 1..=3 {
        let path = format!("/projects?page={page}&page_size=3&order_by=slug&sort=desc");
        let (_, first) = get_json(&app, &path, Some(&token)).await;
        let (_, again) = get_json(&app, &path, Some(&token)).await;
        assert_eq!(first, again);
        seen.extend(ids(&first, "projects"));
    }

    assert_eq!(seen, vec![7, 6, 5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn test_search_all_over_name_and_slug() {
    let (state, _) = TestAppState::new();
    state.seed_project(7, "mobile", None).await;
    state.seed_project(7, "web-foo", None).await;
    state.seed_project(7, "desktop", None).await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, json) = get_json(
        &app,
        "/projects?page=1&page_size=10&search_all=FOO",
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json, "projects"), vec![2]);
    assert_eq!(json["pagination"]["total_data"], 1);
}

#[tokio::test]
async fn test_unknown_fields_rejected() {
    let (state, _) = TestAppState::new();
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, json) = get_json(
        &app,
        "/projects?page=1&page_size=10&order_by=password_hash",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Unknown field: password_hash");

    let (status, _) = get_json(
        &app,
        "/projects?page=1&page_size=10&search_field=id;DROP&search_value=1",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_listing_requires_page_parameters() {
    let (state, _) = TestAppState::new();
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, json) = get_json(&app, "/projects?page_size=10", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "page is required");

    let (status, _) = get_json(&app, "/projects?page=0&page_size=10", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_foreign_project_not_found() {
    let (state, _) = TestAppState::new();
    let foreign = state.seed_project(8, "theirs", None).await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let path = format!("/projects/{}", foreign.id);
    let (status, _) = get_json(&app, &path, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = put_json(&app, &path, Some(&token), project_body("mine")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = delete_json(&app, &path, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_then_delete() {
    let (state, _) = TestAppState::new();
    let project = state.seed_project(7, "mobile", None).await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);
    let path = format!("/projects/{}", project.id);

    let (status, json) = put_json(&app, &path, Some(&token), project_body("mobile-v2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["slug"], "mobile-v2");
    assert!(json["project"]["updated_at"].is_string());

    let (status, json) = delete_json(&app, &path, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Success delete project");

    let (status, _) = delete_json(&app, &path, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_page_beyond_addressable_range_is_bad_request() {
    let (state, _) = TestAppState::new();
    state.seed_project(7, "mobile", None).await;
    let token = state.token_for(7, false);
    let app = build_test_router(state);

    let (status, json) = get_json(
        &app,
        "/projects?page=184467440737095516&page_size=100",
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "page is out of range");
}
