// ABOUTME: End-to-end tests driving the assembled router with in-memory state
// ABOUTME: Covers auth flows, habit/entry lifecycle, stats, ETags, and authz
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

#![allow(missing_docs, clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use cadence_api::config::ServerConfig;
use cadence_api::database::Database;
use cadence_api::server::{build_router, ServerResources};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

const BODY_LIMIT: usize = 1 << 20;

async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    let database = Database::from_pool(pool);
    database.migrate().await.unwrap();

    let resources = Arc::new(ServerResources::new(
        ServerConfig::for_testing(),
        database,
    ));
    build_router(resources)
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_request(method: &str, uri: &str, token: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));

    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a user and return an access token
async fn register(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            &json!({
                "email": email,
                "password": "correct-horse-battery",
                "confirm_password": "correct-horse-battery"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    body["access_token"].as_str().unwrap().to_owned()
}

// ============================================================================
// Health and auth
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_reports_ok() {
    let app = test_app().await;

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_register_login_and_refresh_flow() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            &json!({
                "email": "flow@example.com",
                "password": "correct-horse-battery",
                "confirm_password": "correct-horse-battery"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let registered = read_json(response).await;
    assert!(registered["access_token"].as_str().unwrap().len() > 20);
    let first_refresh = registered["refresh_token"].as_str().unwrap().to_owned();

    // Login with the same credentials
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            &json!({
                "email": "flow@example.com",
                "password": "correct-horse-battery"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Refresh rotates the token
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/refresh",
            &json!({ "refresh_token": first_refresh }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed = read_json(response).await;
    let second_refresh = refreshed["refresh_token"].as_str().unwrap();
    assert_ne!(second_refresh, first_refresh);

    // The spent token no longer works
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/refresh",
            &json!({ "refresh_token": first_refresh }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let app = test_app().await;
    register(&app, "locked@example.com").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            &json!({
                "email": "locked@example.com",
                "password": "not-the-password"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(Request::get("/api/habits").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::get("/api/entries/stats")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_lookup_is_forbidden_for_regular_users() {
    let app = test_app().await;
    let token = register(&app, "pleb@example.com").await;

    let response = app
        .oneshot(authed_request(
            "GET",
            &format!("/api/users/{}", uuid::Uuid::new_v4()),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Habit + entry lifecycle and statistics
// ============================================================================

async fn create_habit(app: &Router, token: &str) -> String {
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/habits",
            token,
            Some(&json!({
                "name": "Daily reading",
                "habit_type": "measurable",
                "frequency": { "period": "daily", "times_per_period": 1 },
                "target": { "value": 20, "unit": "pages" }
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    body["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn test_entry_lifecycle_feeds_the_stats_endpoint() {
    let app = test_app().await;
    let token = register(&app, "streaks@example.com").await;
    let habit_id = create_habit(&app, &token).await;

    let today = Utc::now().date_naive();
    let yesterday = today.pred_opt().unwrap();

    for (value, date) in [(10, yesterday), (20, today), (5, today)] {
        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/entries",
                &token,
                Some(&json!({
                    "habit_id": habit_id,
                    "value": value,
                    "date": date.format("%Y-%m-%d").to_string()
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/api/entries/stats", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stats = read_json(response).await;
    assert_eq!(stats["total_entries"], 3);
    assert_eq!(stats["current_streak"], 2);
    assert_eq!(stats["longest_streak"], 2);

    let daily = stats["daily_stats"].as_array().unwrap();
    assert_eq!(daily.len(), 2);
    // Most recent first, counting same-day duplicates
    assert_eq!(daily[0]["count"], 2);
    assert_eq!(daily[1]["count"], 1);
}

#[tokio::test]
async fn test_stats_for_a_new_user_are_all_zero() {
    let app = test_app().await;
    let token = register(&app, "empty@example.com").await;

    let response = app
        .oneshot(authed_request("GET", "/api/entries/stats", &token, None))
        .await
        .unwrap();
    let stats = read_json(response).await;

    assert_eq!(stats["total_entries"], 0);
    assert_eq!(stats["current_streak"], 0);
    assert_eq!(stats["longest_streak"], 0);
    assert!(stats["daily_stats"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_future_dated_entries_are_rejected() {
    let app = test_app().await;
    let token = register(&app, "tomorrow@example.com").await;
    let habit_id = create_habit(&app, &token).await;

    let tomorrow = Utc::now().date_naive().succ_opt().unwrap();
    let response = app
        .oneshot(authed_request(
            "POST",
            "/api/entries",
            &token,
            Some(&json!({
                "habit_id": habit_id,
                "value": 1,
                "date": tomorrow.format("%Y-%m-%d").to_string()
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_rejects_unknown_habits_without_partial_insert() {
    let app = test_app().await;
    let token = register(&app, "batch@example.com").await;
    let habit_id = create_habit(&app, &token).await;
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();

    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/entries/batch",
            &token,
            Some(&json!({
                "entries": [
                    { "habit_id": habit_id, "value": 1, "date": today },
                    { "habit_id": uuid::Uuid::new_v4(), "value": 1, "date": today }
                ]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was inserted
    let response = app
        .oneshot(authed_request("GET", "/api/entries/stats", &token, None))
        .await
        .unwrap();
    let stats = read_json(response).await;
    assert_eq!(stats["total_entries"], 0);
}

#[tokio::test]
async fn test_habit_views_project_different_shapes() {
    let app = test_app().await;
    let token = register(&app, "views@example.com").await;
    let habit_id = create_habit(&app, &token).await;

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/api/habits/{habit_id}?view=summary"),
            &token,
            None,
        ))
        .await
        .unwrap();
    let summary = read_json(response).await;
    assert!(summary.get("frequency").is_none());
    assert_eq!(summary["name"], "Daily reading");

    // Unknown view names are a client error, not a silent default
    let response = app
        .oneshot(authed_request(
            "GET",
            &format!("/api/habits/{habit_id}?view=everything"),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_links_are_attached_only_on_request() {
    let app = test_app().await;
    let token = register(&app, "hypermedia@example.com").await;
    let habit_id = create_habit(&app, &token).await;

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/api/habits/{habit_id}"),
            &token,
            None,
        ))
        .await
        .unwrap();
    let plain = read_json(response).await;
    assert!(plain.get("links").is_none());

    let response = app
        .oneshot(authed_request(
            "GET",
            &format!("/api/habits/{habit_id}?include_links=true"),
            &token,
            None,
        ))
        .await
        .unwrap();
    let linked = read_json(response).await;
    let links = linked["links"].as_array().unwrap();
    assert!(links.iter().any(|l| l["rel"] == "self"));
    assert!(links
        .iter()
        .any(|l| l["href"] == format!("/api/habits/{habit_id}")));
}

// ============================================================================
// Conditional GET
// ============================================================================

#[tokio::test]
async fn test_conditional_get_returns_304_until_data_changes() {
    let app = test_app().await;
    let token = register(&app, "etag@example.com").await;
    let habit_id = create_habit(&app, &token).await;

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/api/entries/stats", &token, None))
        .await
        .unwrap();
    let etag = response
        .headers()
        .get(header::ETAG)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();

    // Same resource, matching tag: not modified
    let mut request = authed_request("GET", "/api/entries/stats", &token, None);
    request
        .headers_mut()
        .insert(header::IF_NONE_MATCH, etag.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

    // A write invalidates the cached tag
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    app.clone()
        .oneshot(authed_request(
            "POST",
            "/api/entries",
            &token,
            Some(&json!({ "habit_id": habit_id, "value": 1, "date": today })),
        ))
        .await
        .unwrap();

    let mut request = authed_request("GET", "/api/entries/stats", &token, None);
    request
        .headers_mut()
        .insert(header::IF_NONE_MATCH, etag.parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
