// ABOUTME: GitHub integration route handlers
// ABOUTME: Personal access token storage plus profile and event browsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::authenticate;
use crate::errors::AppError;
use crate::server::ServerResources;

/// Default number of events returned
const DEFAULT_EVENTS_PER_PAGE: u32 = 30;
/// GitHub's hard cap on events per page
const MAX_EVENTS_PER_PAGE: u32 = 100;

/// Request body for storing a personal access token
#[derive(Debug, Deserialize)]
pub struct StoreTokenBody {
    /// The personal access token
    pub access_token: String,
    /// Optional expiry supplied by the user
    pub expires_at: Option<DateTime<Utc>>,
}

/// Query parameters for the events listing
#[derive(Debug, Deserialize, Default)]
pub struct EventsQuery {
    /// Events per page, capped at GitHub's limit
    pub per_page: Option<u32>,
}

/// GitHub routes handler
pub struct GitHubRoutes;

impl GitHubRoutes {
    /// Create all GitHub routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/github/token", put(Self::handle_store_token))
            .route("/api/github/token", delete(Self::handle_revoke_token))
            .route("/api/github/profile", get(Self::handle_profile))
            .route("/api/github/events", get(Self::handle_events))
            .with_state(resources)
    }

    /// Handle PUT /api/github/token
    async fn handle_store_token(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<StoreTokenBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        if body.access_token.trim().is_empty() {
            return Err(AppError::invalid_input("Access token must not be empty"));
        }

        resources
            .database
            .store_github_token(auth.user_id, body.access_token.trim(), body.expires_at)
            .await?;

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    /// Handle DELETE /api/github/token
    async fn handle_revoke_token(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        resources.database.revoke_github_token(auth.user_id).await?;
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    /// Handle GET /api/github/profile
    async fn handle_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        let token = resources
            .database
            .get_github_token(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("GitHub access token"))?;

        let profile = resources.github.get_user_profile(&token).await?;
        Ok((StatusCode::OK, Json(profile)).into_response())
    }

    /// Handle GET /api/github/events
    async fn handle_events(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<EventsQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        let token = resources
            .database
            .get_github_token(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("GitHub access token"))?;

        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_EVENTS_PER_PAGE)
            .clamp(1, MAX_EVENTS_PER_PAGE);

        // Events are keyed by login, so resolve the profile first
        let profile = resources.github.get_user_profile(&token).await?;
        let events = resources
            .github
            .get_user_events(&token, &profile.login, per_page)
            .await?;

        Ok((StatusCode::OK, Json(events)).into_response())
    }
}
