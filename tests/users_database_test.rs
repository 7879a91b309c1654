// ABOUTME: Integration tests for user accounts and refresh tokens
// ABOUTME: Covers registration transactionality, lookups, rotation, and pruning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

#![allow(missing_docs, clippy::unwrap_used)]

use cadence_api::database::Database;
use cadence_api::errors::ErrorCode;
use cadence_api::models::User;
use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

async fn create_test_db() -> Database {
    let pool: SqlitePool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    let db = Database::from_pool(pool);
    db.migrate().await.unwrap();
    db
}

fn test_user(email: &str) -> User {
    User::new(
        email.to_owned(),
        "bcrypt-hash-placeholder".to_owned(),
        Some("Test User".to_owned()),
    )
}

// ============================================================================
// Connection setup
// ============================================================================

#[tokio::test]
async fn test_file_backed_database_is_created_on_demand() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}/cadence.db", dir.path().display());

    let db = Database::new(&url).await.unwrap();
    let user = test_user("file@example.com");
    db.create_user(&user).await.unwrap();

    assert!(db.get_user(user.id).await.unwrap().is_some());
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_create_and_fetch_user() {
    let db = create_test_db().await;
    let user = test_user("streaker@example.com");

    let id = db.create_user(&user).await.unwrap();
    assert_eq!(id, user.id);

    let by_id = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "streaker@example.com");
    assert_eq!(by_id.display_name, Some("Test User".to_owned()));
    assert!(!by_id.is_admin);

    let by_email = db
        .get_user_by_email("streaker@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn test_duplicate_email_is_a_conflict() {
    let db = create_test_db().await;

    db.create_user(&test_user("dup@example.com")).await.unwrap();
    let err = db
        .create_user(&test_user("dup@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[tokio::test]
async fn test_required_lookup_reports_not_found() {
    let db = create_test_db().await;
    let err = db
        .get_user_by_email_required("ghost@example.com")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_touch_last_active_moves_the_timestamp() {
    let db = create_test_db().await;
    let user = test_user("active@example.com");
    db.create_user(&user).await.unwrap();

    db.touch_last_active(user.id).await.unwrap();
    let fetched = db.get_user(user.id).await.unwrap().unwrap();
    assert!(fetched.last_active >= user.last_active);
}

// ============================================================================
// Registration transaction
// ============================================================================

#[tokio::test]
async fn test_register_user_writes_user_and_token_together() {
    let db = create_test_db().await;
    let user = test_user("fresh@example.com");

    let refresh = db.register_user(&user, "opaque-token-1", 7).await.unwrap();
    assert_eq!(refresh.user_id, user.id);
    assert!(refresh.expires_at > Utc::now());

    assert!(db.get_user(user.id).await.unwrap().is_some());
    let stored = db.get_refresh_token("opaque-token-1").await.unwrap().unwrap();
    assert_eq!(stored.user_id, user.id);
}

#[tokio::test]
async fn test_register_user_rejects_duplicate_email_leaving_no_token() {
    let db = create_test_db().await;
    let user = test_user("taken@example.com");
    db.register_user(&user, "token-a", 7).await.unwrap();

    let again = test_user("taken@example.com");
    let err = db.register_user(&again, "token-b", 7).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);

    // The failed registration left nothing behind
    assert!(db.get_refresh_token("token-b").await.unwrap().is_none());
    let row = sqlx::query("SELECT COUNT(*) as n FROM users WHERE email = 'taken@example.com'")
        .fetch_one(db.pool())
        .await
        .unwrap();
    let n: i64 = row.get("n");
    assert_eq!(n, 1);
}

// ============================================================================
// Refresh tokens
// ============================================================================

#[tokio::test]
async fn test_rotation_invalidates_the_old_value() {
    let db = create_test_db().await;
    let user = test_user("rotate@example.com");
    db.create_user(&user).await.unwrap();

    let stored = db
        .create_refresh_token(user.id, "before-rotation", 7)
        .await
        .unwrap();

    db.rotate_refresh_token(stored.id, "after-rotation", 7)
        .await
        .unwrap();

    assert!(db.get_refresh_token("before-rotation").await.unwrap().is_none());
    let rotated = db.get_refresh_token("after-rotation").await.unwrap().unwrap();
    assert_eq!(rotated.id, stored.id);
    assert_eq!(rotated.user_id, user.id);
}

#[tokio::test]
async fn test_prune_removes_only_expired_tokens() {
    let db = create_test_db().await;
    let user = test_user("prune@example.com");
    db.create_user(&user).await.unwrap();

    db.create_refresh_token(user.id, "long-lived", 7).await.unwrap();
    let short = db.create_refresh_token(user.id, "short-lived", 1).await.unwrap();

    // Prune as of a moment after the short token's expiry
    let pruned = db
        .prune_expired_refresh_tokens(short.expires_at + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(pruned, 1);

    assert!(db.get_refresh_token("short-lived").await.unwrap().is_none());
    assert!(db.get_refresh_token("long-lived").await.unwrap().is_some());
}
