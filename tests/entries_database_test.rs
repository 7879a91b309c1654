// ABOUTME: Integration tests for the entries database manager
// ABOUTME: Covers CRUD, batch atomicity, filters, archival, and date extraction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

#![allow(missing_docs, clippy::unwrap_used)]

use cadence_api::database::{
    CreateEntryRequest, Database, EntriesManager, EntryFilter, EntrySort, UpdateEntryRequest,
};
use cadence_api::models::EntrySource;
use chrono::NaiveDate;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    Database::from_pool(pool.clone()).migrate().await.unwrap();
    pool
}

async fn seed_user(pool: &SqlitePool, id: Uuid) {
    sqlx::query(
        r"
        INSERT INTO users (id, email, password_hash, created_at, last_active)
        VALUES ($1, $2, 'hash', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')
        ",
    )
    .bind(id.to_string())
    .bind(format!("{id}@example.com"))
    .execute(pool)
    .await
    .unwrap();
}

async fn seed_habit(pool: &SqlitePool, user_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r"
        INSERT INTO habits (id, user_id, name, created_at)
        VALUES ($1, $2, 'Reading', '2025-01-01T00:00:00Z')
        ",
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await
    .unwrap();
    id
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn entry_request(habit_id: Uuid, value: i32, d: NaiveDate) -> CreateEntryRequest {
    CreateEntryRequest {
        habit_id,
        value,
        notes: None,
        source: EntrySource::Manual,
        external_id: None,
        date: d,
    }
}

// ============================================================================
// Create and get
// ============================================================================

#[tokio::test]
async fn test_create_and_get_entry() {
    let pool = create_test_pool().await;
    let user = Uuid::new_v4();
    seed_user(&pool, user).await;
    let habit = seed_habit(&pool, user).await;
    let manager = EntriesManager::new(pool);

    let request = CreateEntryRequest {
        habit_id: habit,
        value: 25,
        notes: Some("Chapter four".to_owned()),
        source: EntrySource::Manual,
        external_id: None,
        date: date(2025, 6, 10),
    };

    let created = manager.create(user, &request).await.unwrap();
    assert_eq!(created.habit_id, habit);
    assert_eq!(created.value, 25);
    assert!(!created.is_archived);

    let fetched = manager.get(created.id, user).await.unwrap().unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.notes, Some("Chapter four".to_owned()));
    assert_eq!(fetched.date, date(2025, 6, 10));
    assert_eq!(fetched.source, EntrySource::Manual);
}

#[tokio::test]
async fn test_entries_are_scoped_to_their_owner() {
    let pool = create_test_pool().await;
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();
    seed_user(&pool, owner).await;
    seed_user(&pool, other).await;
    let habit = seed_habit(&pool, owner).await;
    let manager = EntriesManager::new(pool);

    let created = manager
        .create(owner, &entry_request(habit, 1, date(2025, 6, 10)))
        .await
        .unwrap();

    assert!(manager.get(created.id, other).await.unwrap().is_none());
    assert!(!manager.delete(created.id, other).await.unwrap());
    assert!(manager.get(created.id, owner).await.unwrap().is_some());
}

// ============================================================================
// Batch creation
// ============================================================================

#[tokio::test]
async fn test_batch_creates_all_entries() {
    let pool = create_test_pool().await;
    let user = Uuid::new_v4();
    seed_user(&pool, user).await;
    let habit = seed_habit(&pool, user).await;
    let manager = EntriesManager::new(pool);

    let requests: Vec<CreateEntryRequest> = (1..=5)
        .map(|n| entry_request(habit, n, date(2025, 6, n as u32)))
        .collect();

    let created = manager.create_batch(user, &requests).await.unwrap();
    assert_eq!(created.len(), 5);

    let total = manager.count(user, &EntryFilter::default()).await.unwrap();
    assert_eq!(total, 5);
}

// ============================================================================
// Listing, filters, sort
// ============================================================================

#[tokio::test]
async fn test_list_filters_by_date_range_and_source() {
    let pool = create_test_pool().await;
    let user = Uuid::new_v4();
    seed_user(&pool, user).await;
    let habit = seed_habit(&pool, user).await;
    let manager = EntriesManager::new(pool);

    for day in [1, 5, 10, 20] {
        manager
            .create(user, &entry_request(habit, 1, date(2025, 6, day)))
            .await
            .unwrap();
    }

    let filter = EntryFilter {
        from_date: Some(date(2025, 6, 4)),
        to_date: Some(date(2025, 6, 11)),
        ..Default::default()
    };
    let listed = manager
        .list(user, &filter, EntrySort::DateAsc, 50, 0)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].date, date(2025, 6, 5));
    assert_eq!(listed[1].date, date(2025, 6, 10));

    let filter = EntryFilter {
        source: Some(EntrySource::Automation),
        ..Default::default()
    };
    assert_eq!(manager.count(user, &filter).await.unwrap(), 0);
}

#[tokio::test]
async fn test_default_sort_is_most_recent_first() {
    let pool = create_test_pool().await;
    let user = Uuid::new_v4();
    seed_user(&pool, user).await;
    let habit = seed_habit(&pool, user).await;
    let manager = EntriesManager::new(pool);

    for day in [3, 1, 2] {
        manager
            .create(user, &entry_request(habit, 1, date(2025, 6, day)))
            .await
            .unwrap();
    }

    let listed = manager
        .list(user, &EntryFilter::default(), EntrySort::DateDesc, 50, 0)
        .await
        .unwrap();
    let dates: Vec<NaiveDate> = listed.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![date(2025, 6, 3), date(2025, 6, 2), date(2025, 6, 1)]);
}

// ============================================================================
// Update, archive, delete
// ============================================================================

#[tokio::test]
async fn test_update_replaces_value_notes_and_date() {
    let pool = create_test_pool().await;
    let user = Uuid::new_v4();
    seed_user(&pool, user).await;
    let habit = seed_habit(&pool, user).await;
    let manager = EntriesManager::new(pool);

    let created = manager
        .create(user, &entry_request(habit, 1, date(2025, 6, 1)))
        .await
        .unwrap();

    let updated = manager
        .update(
            created.id,
            user,
            &UpdateEntryRequest {
                value: 42,
                notes: Some("Revised".to_owned()),
                date: date(2025, 6, 2),
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.value, 42);
    assert_eq!(updated.notes, Some("Revised".to_owned()));
    assert_eq!(updated.date, date(2025, 6, 2));
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn test_archive_round_trip() {
    let pool = create_test_pool().await;
    let user = Uuid::new_v4();
    seed_user(&pool, user).await;
    let habit = seed_habit(&pool, user).await;
    let manager = EntriesManager::new(pool);

    let created = manager
        .create(user, &entry_request(habit, 1, date(2025, 6, 1)))
        .await
        .unwrap();

    assert!(manager.set_archived(created.id, user, true).await.unwrap());
    let archived = manager.get(created.id, user).await.unwrap().unwrap();
    assert!(archived.is_archived);

    assert!(manager.set_archived(created.id, user, false).await.unwrap());
    let restored = manager.get(created.id, user).await.unwrap().unwrap();
    assert!(!restored.is_archived);
}

#[tokio::test]
async fn test_delete_removes_the_entry() {
    let pool = create_test_pool().await;
    let user = Uuid::new_v4();
    seed_user(&pool, user).await;
    let habit = seed_habit(&pool, user).await;
    let manager = EntriesManager::new(pool);

    let created = manager
        .create(user, &entry_request(habit, 1, date(2025, 6, 1)))
        .await
        .unwrap();

    assert!(manager.delete(created.id, user).await.unwrap());
    assert!(manager.get(created.id, user).await.unwrap().is_none());
    assert!(!manager.delete(created.id, user).await.unwrap());
}

// ============================================================================
// Statistics input
// ============================================================================

#[tokio::test]
async fn test_entry_dates_returns_every_entry_including_archived() {
    let pool = create_test_pool().await;
    let user = Uuid::new_v4();
    seed_user(&pool, user).await;
    let habit = seed_habit(&pool, user).await;
    let manager = EntriesManager::new(pool);

    // Two entries on the same day, one of them archived afterwards
    let first = manager
        .create(user, &entry_request(habit, 1, date(2025, 6, 1)))
        .await
        .unwrap();
    manager
        .create(user, &entry_request(habit, 2, date(2025, 6, 1)))
        .await
        .unwrap();
    manager
        .create(user, &entry_request(habit, 3, date(2025, 6, 3)))
        .await
        .unwrap();
    manager.set_archived(first.id, user, true).await.unwrap();

    let dates = manager.entry_dates(user).await.unwrap();
    assert_eq!(
        dates,
        vec![date(2025, 6, 1), date(2025, 6, 1), date(2025, 6, 3)]
    );
}
