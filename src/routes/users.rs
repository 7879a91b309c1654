// ABOUTME: User profile route handlers
// ABOUTME: Current-user lookup plus admin-only lookup by id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use super::authenticate;
use crate::errors::AppError;
use crate::models::User;
use crate::server::ServerResources;

/// User profile response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User id
    pub id: String,
    /// Email address
    pub email: String,
    /// Display name, if set
    pub display_name: Option<String>,
    /// Admin flag
    pub is_admin: bool,
    /// Account creation timestamp
    pub created_at: String,
    /// Last authenticated activity
    pub last_active: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            display_name: user.display_name,
            is_admin: user.is_admin,
            created_at: user.created_at.to_rfc3339(),
            last_active: user.last_active.to_rfc3339(),
        }
    }
}

/// User routes handler
pub struct UsersRoutes;

impl UsersRoutes {
    /// Create all user routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/users/me", get(Self::handle_me))
            .route("/api/users/:id", get(Self::handle_get_by_id))
            .with_state(resources)
    }

    /// Handle GET /api/users/me
    async fn handle_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        let user = resources
            .database
            .get_user(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let response: UserResponse = user.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/users/:id - admin only
    async fn handle_get_by_id(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        if !auth.is_admin {
            return Err(AppError::permission_denied(
                "Only admins may look up other users",
            ));
        }

        let user = resources
            .database
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id}")))?;

        let response: UserResponse = user.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
