// ABOUTME: Route module organization for the Cadence HTTP API
// ABOUTME: Route structs per domain plus the shared bearer authentication helper
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! HTTP routes
//!
//! Each domain module exposes a unit struct with a `routes()` constructor
//! returning an axum `Router`. Handlers are thin: authenticate, validate,
//! delegate to a database manager or service, convert to a response DTO.

/// Registration, login, and token refresh
pub mod auth;
/// Entry CRUD, batch creation, archival, and statistics
pub mod entries;
/// GitHub token management and activity browsing
pub mod github;
/// Habit CRUD and tag assignment
pub mod habits;
/// Liveness endpoint
pub mod health;
/// Tag CRUD
pub mod tags;
/// User profile endpoints
pub mod users;

pub use auth::AuthRoutes;
pub use entries::EntriesRoutes;
pub use github::GitHubRoutes;
pub use habits::HabitsRoutes;
pub use health::HealthRoutes;
pub use tags::TagsRoutes;
pub use users::UsersRoutes;

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::auth::AuthResult;
use crate::errors::AppResult;
use crate::server::ServerResources;

/// Authenticate the bearer token and charge the request against the user's
/// rate limit. Every authenticated handler goes through here.
pub(crate) fn authenticate(
    headers: &HeaderMap,
    resources: &Arc<ServerResources>,
) -> AppResult<AuthResult> {
    let header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok());
    let auth = resources.auth.authenticate_header(header)?;
    resources.rate_limiter.check(auth.user_id)?;
    Ok(auth)
}
