// ABOUTME: Authentication route handlers for registration, login, and refresh
// ABOUTME: Issues access/refresh token pairs; refresh tokens rotate on use
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Authentication routes
//!
//! Registration writes the user and their first refresh token in one
//! transaction. Passwords are bcrypt-hashed; verification runs on a
//! blocking thread so the async executor is never tied up.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tokio::task;
use tracing::{debug, info};

use crate::auth::{AuthManager, TokenPair};
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::server::ServerResources;

/// Minimum accepted password length
const MIN_PASSWORD_LEN: usize = 8;

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Email address
    pub email: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Password
    pub password: String,
    /// Password repeated; must match
    pub confirm_password: String,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Request body for token refresh
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// The opaque refresh token from a previous response
    pub refresh_token: String,
}

/// Authentication routes handler
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::handle_register))
            .route("/api/auth/login", post(Self::handle_login))
            .route("/api/auth/refresh", post(Self::handle_refresh))
            .with_state(resources)
    }

    /// Handle POST /api/auth/register
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        info!("User registration attempt");

        if !is_valid_email(&body.email) {
            return Err(AppError::invalid_input("Invalid email format"));
        }
        if body.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if body.password != body.confirm_password {
            return Err(AppError::invalid_input("Passwords do not match"));
        }

        let password_hash = hash_password(body.password).await?;
        let user = User::new(body.email, password_hash, body.display_name);

        let refresh_token = AuthManager::generate_refresh_token();
        resources
            .database
            .register_user(&user, &refresh_token, resources.config.refresh_token_days)
            .await?;

        let access_token = resources.auth.generate_access_token(&user)?;
        info!(user_id = %user.id, "User registered successfully");

        let pair = TokenPair {
            access_token,
            refresh_token,
            expires_at: resources.auth.access_token_expiry(),
        };
        Ok((StatusCode::CREATED, Json(pair)).into_response())
    }

    /// Handle POST /api/auth/login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        debug!("User login attempt");

        let user = resources
            .database
            .get_user_by_email_required(&body.email)
            .await
            .map_err(|e| {
                debug!(error = %e, "Login failed: user lookup");
                AppError::auth_invalid("Invalid email or password")
            })?;

        // Verify password off the async executor
        let password = body.password;
        let password_hash = user.password_hash.clone();
        let is_valid = task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
            .map_err(|_| AppError::auth_invalid("Invalid email or password"))?;

        if !is_valid {
            return Err(AppError::auth_invalid("Invalid email or password"));
        }

        resources.database.touch_last_active(user.id).await?;

        let refresh_token = AuthManager::generate_refresh_token();
        resources
            .database
            .create_refresh_token(user.id, &refresh_token, resources.config.refresh_token_days)
            .await?;

        let access_token = resources.auth.generate_access_token(&user)?;
        info!(user_id = %user.id, "User logged in");

        let pair = TokenPair {
            access_token,
            refresh_token,
            expires_at: resources.auth.access_token_expiry(),
        };
        Ok((StatusCode::OK, Json(pair)).into_response())
    }

    /// Handle POST /api/auth/refresh
    async fn handle_refresh(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<RefreshRequest>,
    ) -> Result<Response, AppError> {
        let stored = resources
            .database
            .get_refresh_token(&body.refresh_token)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Unknown refresh token"))?;

        if stored.expires_at < Utc::now() {
            return Err(AppError::auth_expired("Refresh token has expired"));
        }

        let user = resources
            .database
            .get_user(stored.user_id)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Token user no longer exists"))?;

        // Rotate: the presented token is single-use
        let new_refresh = AuthManager::generate_refresh_token();
        resources
            .database
            .rotate_refresh_token(stored.id, &new_refresh, resources.config.refresh_token_days)
            .await?;

        // Opportunistic housekeeping while we're already touching the table
        resources
            .database
            .prune_expired_refresh_tokens(Utc::now())
            .await?;

        let access_token = resources.auth.generate_access_token(&user)?;

        let pair = TokenPair {
            access_token,
            refresh_token: new_refresh,
            expires_at: resources.auth.access_token_expiry(),
        };
        Ok((StatusCode::OK, Json(pair)).into_response())
    }
}

/// Minimal structural email check; deliverability is not our problem
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

async fn hash_password(password: String) -> AppResult<String> {
    task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}
