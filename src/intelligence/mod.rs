// ABOUTME: Derived analytics over user data, computed fresh per request
// ABOUTME: Currently hosts the entry statistics engine (daily counts and streaks)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Request-scoped analytics
//!
//! Nothing in this module touches storage or performs I/O; callers fetch the
//! raw data and hand it in.

pub mod stats;

pub use stats::{DailyStat, StatsCalculator, StatsResult};
