// ABOUTME: Server resource wiring and router assembly
// ABOUTME: ServerResources is the shared state handed to every route module
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Server assembly
//!
//! [`ServerResources`] bundles the database handle, auth manager, GitHub
//! client, ETag cache, and rate limiter. [`build_router`] merges every
//! domain's routes and layers the cross-cutting middleware on top.

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::etag::{etag_middleware, EtagCache};
use crate::github::GitHubClient;
use crate::rate_limiting::RateLimiter;
use crate::routes::{
    AuthRoutes, EntriesRoutes, GitHubRoutes, HabitsRoutes, HealthRoutes, TagsRoutes, UsersRoutes,
};

/// Request timeout applied to every route
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for the whole server
pub struct ServerResources {
    /// Database handle
    pub database: Database,
    /// Bearer token authority
    pub auth: AuthManager,
    /// GitHub API client
    pub github: GitHubClient,
    /// Bounded ETag store
    pub etag_cache: EtagCache,
    /// Per-user request limiter
    pub rate_limiter: RateLimiter,
    /// Loaded configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Assemble resources from configuration and an initialized database
    #[must_use]
    pub fn new(config: ServerConfig, database: Database) -> Self {
        Self {
            auth: AuthManager::new(&config.jwt_secret, config.access_token_minutes),
            github: GitHubClient::new(&config.github_api_base),
            etag_cache: EtagCache::new(config.etag_cache_capacity),
            rate_limiter: RateLimiter::new(config.rate_limit_per_minute),
            database,
            config,
        }
    }
}

/// Build the complete application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(UsersRoutes::routes(resources.clone()))
        .merge(HabitsRoutes::routes(resources.clone()))
        .merge(TagsRoutes::routes(resources.clone()))
        .merge(EntriesRoutes::routes(resources.clone()))
        .merge(GitHubRoutes::routes(resources.clone()))
        .layer(middleware::from_fn_with_state(
            resources,
            etag_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
}

/// Run the HTTP server until shutdown
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn run(config: ServerConfig) -> AppResult<()> {
    let database = Database::new(&config.database_url).await?;
    let port = config.http_port;
    let resources = Arc::new(ServerResources::new(config, database));
    let app = build_router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind port {port}: {e}")))?;

    info!("Cadence API listening on port {port}");
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))
}
