// ABOUTME: Entry statistics engine computing daily counts and streak metrics
// ABOUTME: Pure single-pass computation over a user's entry dates, no I/O
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Entry statistics
//!
//! [`StatsCalculator::compute`] takes every calendar date a user logged an
//! entry on (duplicates allowed, any order) plus a reference "today" and
//! produces per-day counts, the total entry count, and the current/longest
//! streaks. The result is derived state: computed fresh per request, never
//! persisted.
//!
//! A streak only counts as *current* when its most recent day is exactly
//! today. A run that ended yesterday scores a current streak of 0, no matter
//! how long it was. The longest streak is independent of today.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of entries logged on one calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    /// The calendar date
    pub date: NaiveDate,
    /// How many entries were logged on it (>= 1)
    pub count: u32,
}

/// Aggregate statistics over a user's entry history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResult {
    /// Per-date counts, most recent date first, no duplicate dates
    pub daily_stats: Vec<DailyStat>,
    /// Total number of entries (counting same-day duplicates)
    pub total_entries: u32,
    /// Length of the streak ending today, 0 if today has no entry
    pub current_streak: u32,
    /// Longest run of consecutive days anywhere in the history
    pub longest_streak: u32,
}

impl StatsResult {
    /// The well-defined result for a user with no entries
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            daily_stats: Vec::new(),
            total_entries: 0,
            current_streak: 0,
            longest_streak: 0,
        }
    }
}

/// Pure calculator over entry dates
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute aggregate statistics for one user's entry dates.
    ///
    /// `dates` holds one element per entry; the same date may appear more
    /// than once. Ordering does not matter. `today` is the caller's
    /// reference date (UTC calendar date at request time).
    #[must_use]
    pub fn compute(dates: &[NaiveDate], today: NaiveDate) -> StatsResult {
        if dates.is_empty() {
            return StatsResult::empty();
        }

        let mut counts: HashMap<NaiveDate, u32> = HashMap::new();
        for date in dates {
            *counts.entry(*date).or_insert(0) += 1;
        }

        let mut daily_stats: Vec<DailyStat> = counts
            .iter()
            .map(|(&date, &count)| DailyStat { date, count })
            .collect();
        daily_stats.sort_by(|a, b| b.date.cmp(&a.date));

        let total_entries = dates.len() as u32;

        let mut distinct: Vec<NaiveDate> = counts.into_keys().collect();
        distinct.sort_unstable();

        StatsResult {
            current_streak: Self::current_streak(&distinct, today),
            longest_streak: Self::longest_streak(&distinct),
            daily_stats,
            total_entries,
        }
    }

    /// Walk backward from the most recent date; the streak is only live if
    /// that date is today.
    fn current_streak(distinct: &[NaiveDate], today: NaiveDate) -> u32 {
        let Some(&last) = distinct.last() else {
            return 0;
        };
        if last != today {
            return 0;
        }

        let mut streak = 1;
        for pair in distinct.windows(2).rev() {
            if pair[0].checked_add_days(Days::new(1)) == Some(pair[1]) {
                streak += 1;
            } else {
                break;
            }
        }
        streak
    }

    /// Longest consecutive run over sorted distinct dates, single forward pass.
    fn longest_streak(distinct: &[NaiveDate]) -> u32 {
        let mut longest = 0;
        let mut run = 0;
        let mut prev: Option<NaiveDate> = None;

        for &date in distinct {
            run = match prev {
                Some(p) if p.checked_add_days(Days::new(1)) == Some(date) => run + 1,
                _ => 1,
            };
            longest = longest.max(run);
            prev = Some(date);
        }
        longest
    }
}
