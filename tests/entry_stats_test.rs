// ABOUTME: Unit tests for the entry statistics engine
// ABOUTME: Covers empty input, streak policies, duplicates, and order independence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

#![allow(missing_docs, clippy::unwrap_used)]

use cadence_api::intelligence::{DailyStat, StatsCalculator, StatsResult};
use chrono::{Days, NaiveDate};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn days_before(base: NaiveDate, n: u64) -> NaiveDate {
    base.checked_sub_days(Days::new(n)).unwrap()
}

const TODAY: (i32, u32, u32) = (2025, 6, 15);

fn today() -> NaiveDate {
    date(TODAY.0, TODAY.1, TODAY.2)
}

// ============================================================================
// Zero and single-entry cases
// ============================================================================

#[test]
fn no_entries_yields_the_zero_result() {
    let result = StatsCalculator::compute(&[], today());

    assert_eq!(result, StatsResult::empty());
    assert!(result.daily_stats.is_empty());
    assert_eq!(result.total_entries, 0);
    assert_eq!(result.current_streak, 0);
    assert_eq!(result.longest_streak, 0);
}

#[test]
fn single_entry_today_counts_as_a_full_streak_of_one() {
    let result = StatsCalculator::compute(&[today()], today());

    assert_eq!(
        result.daily_stats,
        vec![DailyStat {
            date: today(),
            count: 1
        }]
    );
    assert_eq!(result.total_entries, 1);
    assert_eq!(result.current_streak, 1);
    assert_eq!(result.longest_streak, 1);
}

// ============================================================================
// Streak policy
// ============================================================================

#[test]
fn missing_yesterday_breaks_the_current_streak() {
    // today-3, today-2, today: the two-day historical run stays longest
    let dates = [
        days_before(today(), 3),
        days_before(today(), 2),
        today(),
    ];
    let result = StatsCalculator::compute(&dates, today());

    assert_eq!(result.current_streak, 1);
    assert_eq!(result.longest_streak, 2);
}

#[test]
fn run_not_touching_today_scores_zero_current_streak() {
    // Three consecutive days ending at today-3
    let dates = [
        days_before(today(), 5),
        days_before(today(), 4),
        days_before(today(), 3),
    ];
    let result = StatsCalculator::compute(&dates, today());

    assert_eq!(result.current_streak, 0);
    assert_eq!(result.longest_streak, 3);
}

#[test]
fn unbroken_run_ending_today_counts_fully() {
    let dates: Vec<NaiveDate> = (0..7).map(|n| days_before(today(), n)).collect();
    let result = StatsCalculator::compute(&dates, today());

    assert_eq!(result.current_streak, 7);
    assert_eq!(result.longest_streak, 7);
}

#[test]
fn longest_streak_can_live_entirely_in_the_past() {
    // A ten-day run long ago, plus an entry today
    let anchor = date(2025, 1, 20);
    let mut dates: Vec<NaiveDate> = (0..10).map(|n| days_before(anchor, n)).collect();
    dates.push(today());

    let result = StatsCalculator::compute(&dates, today());
    assert_eq!(result.current_streak, 1);
    assert_eq!(result.longest_streak, 10);
}

#[test]
fn streaks_cross_month_boundaries() {
    let reference = date(2025, 3, 1);
    let dates = [date(2025, 2, 27), date(2025, 2, 28), reference];
    let result = StatsCalculator::compute(&dates, reference);

    assert_eq!(result.current_streak, 3);
}

#[test]
fn streaks_respect_leap_years() {
    let reference = date(2024, 3, 1);
    let dates = [date(2024, 2, 28), date(2024, 2, 29), reference];
    let result = StatsCalculator::compute(&dates, reference);

    assert_eq!(result.current_streak, 3);

    // In a non-leap year the same feb-28 -> mar-1 jump is a gap
    let reference = date(2025, 3, 1);
    let dates = [date(2025, 2, 27), reference];
    let result = StatsCalculator::compute(&dates, reference);
    assert_eq!(result.current_streak, 1);
}

// ============================================================================
// Duplicates and daily stats
// ============================================================================

#[test]
fn duplicate_days_inflate_totals_but_not_streaks() {
    let yesterday = days_before(today(), 1);
    let dates = [today(), today(), yesterday];
    let result = StatsCalculator::compute(&dates, today());

    assert_eq!(result.total_entries, 3);
    assert_eq!(result.current_streak, 2);
    assert_eq!(result.longest_streak, 2);

    assert_eq!(result.daily_stats.len(), 2);
    assert_eq!(
        result.daily_stats[0],
        DailyStat {
            date: today(),
            count: 2
        }
    );
    assert_eq!(
        result.daily_stats[1],
        DailyStat {
            date: yesterday,
            count: 1
        }
    );
}

#[test]
fn daily_stats_are_sorted_most_recent_first() {
    let dates = [
        days_before(today(), 4),
        days_before(today(), 9),
        today(),
        days_before(today(), 1),
    ];
    let result = StatsCalculator::compute(&dates, today());

    let sorted_desc: Vec<NaiveDate> = result.daily_stats.iter().map(|s| s.date).collect();
    let mut expected = sorted_desc.clone();
    expected.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(sorted_desc, expected);
}

#[test]
fn total_entries_equals_sum_of_daily_counts() {
    let dates = [
        today(),
        today(),
        today(),
        days_before(today(), 2),
        days_before(today(), 2),
        days_before(today(), 30),
    ];
    let result = StatsCalculator::compute(&dates, today());

    let sum: u32 = result.daily_stats.iter().map(|s| s.count).sum();
    assert_eq!(result.total_entries, sum);
    assert_eq!(result.total_entries, 6);
}

// ============================================================================
// Determinism and invariants
// ============================================================================

#[test]
fn input_order_never_changes_the_result() {
    let dates = vec![
        days_before(today(), 6),
        today(),
        days_before(today(), 1),
        days_before(today(), 5),
        days_before(today(), 1),
        days_before(today(), 12),
    ];

    let baseline = StatsCalculator::compute(&dates, today());

    // A few deterministic permutations
    let mut reversed = dates.clone();
    reversed.reverse();
    assert_eq!(StatsCalculator::compute(&reversed, today()), baseline);

    let mut rotated = dates.clone();
    rotated.rotate_left(3);
    assert_eq!(StatsCalculator::compute(&rotated, today()), baseline);

    let mut sorted = dates;
    sorted.sort_unstable();
    assert_eq!(StatsCalculator::compute(&sorted, today()), baseline);
}

#[test]
fn longest_streak_is_never_below_current_streak() {
    // Generated date sets with varied gap patterns; invariant must hold for
    // every one of them
    let patterns: Vec<Vec<u64>> = vec![
        vec![0],
        vec![0, 1, 2, 3],
        vec![0, 2, 3, 4],
        vec![1, 2, 3],
        vec![0, 1, 5, 6, 7, 8, 9],
        vec![0, 0, 1, 1, 2],
        vec![10, 20, 30],
        vec![0, 1, 2, 10, 11, 12, 13, 14],
    ];

    for offsets in patterns {
        let dates: Vec<NaiveDate> = offsets
            .iter()
            .map(|&n| days_before(today(), n))
            .collect();
        let result = StatsCalculator::compute(&dates, today());
        assert!(
            result.longest_streak >= result.current_streak,
            "violated for offsets {offsets:?}: longest={} current={}",
            result.longest_streak,
            result.current_streak
        );
    }
}
