// ABOUTME: Environment-based server configuration with validated defaults
// ABOUTME: Reads CADENCE_* variables once at startup into an immutable ServerConfig
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Environment configuration
//!
//! Every knob has a default suitable for local development except the JWT
//! secret, which must be set explicitly — refusing to boot beats signing
//! tokens with a known key.

use std::env;

use crate::errors::{AppError, AppResult, ErrorCode};

/// Default HTTP port
const DEFAULT_HTTP_PORT: u16 = 8081;
/// Default SQLite database URL
const DEFAULT_DATABASE_URL: &str = "sqlite:./data/cadence.db";
/// Default access token lifetime in minutes
const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 30;
/// Default refresh token lifetime in days
const DEFAULT_REFRESH_TOKEN_DAYS: i64 = 7;
/// Default authenticated requests per minute per user
const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 120;
/// Default ETag cache capacity (distinct resource paths)
const DEFAULT_ETAG_CACHE_CAPACITY: usize = 1024;
/// Default GitHub API base URL
const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

/// Immutable server configuration loaded at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP server binds to
    pub http_port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// Symmetric secret for HS256 access tokens
    pub jwt_secret: String,
    /// Access token lifetime in minutes
    pub access_token_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_token_days: i64,
    /// Authenticated requests allowed per user per minute
    pub rate_limit_per_minute: u32,
    /// Maximum number of ETags the cache retains before evicting
    pub etag_cache_capacity: usize,
    /// Base URL of the GitHub API (overridable for tests)
    pub github_api_base: String,
}

impl ServerConfig {
    /// Load configuration from `CADENCE_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `CADENCE_JWT_SECRET` is unset/empty or a numeric
    /// variable fails to parse.
    pub fn from_env() -> AppResult<Self> {
        let jwt_secret = env::var("CADENCE_JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                AppError::new(
                    ErrorCode::InternalError,
                    "CADENCE_JWT_SECRET must be set to a non-empty value",
                )
            })?;

        Ok(Self {
            http_port: parse_var("CADENCE_HTTP_PORT", DEFAULT_HTTP_PORT)?,
            database_url: env::var("CADENCE_DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned()),
            jwt_secret,
            access_token_minutes: parse_var(
                "CADENCE_ACCESS_TOKEN_MINUTES",
                DEFAULT_ACCESS_TOKEN_MINUTES,
            )?,
            refresh_token_days: parse_var("CADENCE_REFRESH_TOKEN_DAYS", DEFAULT_REFRESH_TOKEN_DAYS)?,
            rate_limit_per_minute: parse_var(
                "CADENCE_RATE_LIMIT_PER_MINUTE",
                DEFAULT_RATE_LIMIT_PER_MINUTE,
            )?,
            etag_cache_capacity: parse_var(
                "CADENCE_ETAG_CACHE_CAPACITY",
                DEFAULT_ETAG_CACHE_CAPACITY,
            )?,
            github_api_base: env::var("CADENCE_GITHUB_API_BASE")
                .unwrap_or_else(|_| DEFAULT_GITHUB_API_BASE.to_owned()),
        })
    }

    /// Configuration suitable for tests: in-memory database, fixed secret
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            http_port: 0,
            database_url: "sqlite::memory:".to_owned(),
            jwt_secret: "test-secret-not-for-production".to_owned(),
            access_token_minutes: DEFAULT_ACCESS_TOKEN_MINUTES,
            refresh_token_days: DEFAULT_REFRESH_TOKEN_DAYS,
            rate_limit_per_minute: 10_000,
            etag_cache_capacity: DEFAULT_ETAG_CACHE_CAPACITY,
            github_api_base: DEFAULT_GITHUB_API_BASE.to_owned(),
        }
    }
}

/// Parse an environment variable, falling back to a default when unset
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::invalid_input(format!("{name} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}
