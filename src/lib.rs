// ABOUTME: Library entry point for the Cadence habit tracking API
// ABOUTME: Exposes the domain, persistence, analytics, and HTTP layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

#![deny(unsafe_code)]

//! # Cadence API
//!
//! A habit-tracking REST API. Users register and authenticate, manage
//! habits and tags, log daily entries, and read derived statistics: per-day
//! entry counts, the current streak, and the longest streak.
//!
//! ## Architecture
//!
//! - **models**: domain types shared across layers
//! - **database**: SQLite persistence, one manager per aggregate
//! - **intelligence**: pure derived analytics (the streak engine)
//! - **routes**: axum handlers, one module per domain
//! - **auth**: JWT access tokens and rotating refresh tokens
//! - **github**: client for the activity-import side feature
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use cadence_api::config::ServerConfig;
//! use cadence_api::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     cadence_api::server::run(config).await
//! }
//! ```

/// Authentication and token management
pub mod auth;

/// Configuration management
pub mod config;

/// SQLite persistence layer
pub mod database;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// Bounded ETag cache and conditional-GET middleware
pub mod etag;

/// GitHub API client for the activity-import side feature
pub mod github;

/// Derived analytics over entry history (streaks, daily counts)
pub mod intelligence;

/// Compile-time hypermedia link tables
pub mod links;

/// Structured logging setup
pub mod logging;

/// Core domain models
pub mod models;

/// Offset pagination envelope
pub mod pagination;

/// Per-user request rate limiting
pub mod rate_limiting;

/// HTTP routes grouped by domain
pub mod routes;

/// Server resource wiring and router assembly
pub mod server;
