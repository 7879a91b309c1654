// ABOUTME: Fixed-window per-user request limiter for authenticated routes
// ABOUTME: In-memory counters keyed by user id, reset each minute
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Rate limiting
//!
//! A single fixed window (one minute) per user. Counters live in memory and
//! windows older than the current one are dropped on access, so the map only
//! holds users active in the current window.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Per-user counter for the current window
struct WindowCount {
    window_start: DateTime<Utc>,
    count: u32,
}

/// Rate limit status reported to callers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window resets
    pub reset_at: DateTime<Utc>,
}

/// Fixed-window request limiter
pub struct RateLimiter {
    limit_per_minute: u32,
    counters: Mutex<HashMap<Uuid, WindowCount>>,
}

impl RateLimiter {
    /// Create a limiter allowing `limit_per_minute` requests per user
    #[must_use]
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            limit_per_minute,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `user_id`, rejecting it when over the limit
    ///
    /// # Errors
    ///
    /// Returns `RateLimitExceeded` when the user's window is exhausted.
    pub fn check(&self, user_id: Uuid) -> AppResult<RateLimitStatus> {
        self.check_at(user_id, Utc::now())
    }

    /// Clock-injectable variant of [`Self::check`]
    ///
    /// # Errors
    ///
    /// Returns `RateLimitExceeded` when the user's window is exhausted.
    pub fn check_at(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<RateLimitStatus> {
        let window = Duration::minutes(1);
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| AppError::internal("Rate limiter lock poisoned"))?;

        // Drop counters from previous windows while we hold the lock
        counters.retain(|_, c| now - c.window_start < window);

        let counter = counters.entry(user_id).or_insert(WindowCount {
            window_start: now,
            count: 0,
        });

        let reset_at = counter.window_start + window;
        if counter.count >= self.limit_per_minute {
            return Err(AppError::rate_limited(format!(
                "Rate limit of {} requests per minute exceeded",
                self.limit_per_minute
            )));
        }

        counter.count += 1;
        Ok(RateLimitStatus {
            limit: self.limit_per_minute,
            remaining: self.limit_per_minute - counter.count,
            reset_at,
        })
    }
}
