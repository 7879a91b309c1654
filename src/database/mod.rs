// ABOUTME: Database connection management and schema migration for SQLite
// ABOUTME: Declares per-aggregate submodules (users, habits, tags, entries, tokens)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Database layer
//!
//! A single [`Database`] wraps the SQLite pool. User and token operations
//! live in `impl Database` blocks; the habit/tag/entry aggregates each get a
//! manager struct over a cloned pool.

/// Entry storage and queries
pub mod entries;
/// GitHub personal access token storage
pub mod github_tokens;
/// Habit storage and queries
pub mod habits;
/// Refresh token storage and rotation
pub mod refresh_tokens;
/// Tag storage and queries
pub mod tags;
/// User account storage
pub mod users;

pub use entries::{
    CreateEntryRequest, EntriesManager, EntryFilter, EntrySort, UpdateEntryRequest,
};
pub use habits::{CreateHabitRequest, HabitFilter, HabitsManager, UpdateHabitRequest};
pub use tags::{CreateTagRequest, TagsManager, UpdateTagRequest};

use sqlx::SqlitePool;
use tracing::info;

use crate::errors::{AppError, AppResult};

/// Database handle shared across the server
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or any migration statement fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains(":memory:")
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        info!("Database ready at {database_url}");
        Ok(db)
    }

    /// Wrap an existing pool (used by tests)
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool (managers clone this)
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create all tables if they do not exist. Statements are idempotent so
    /// startup is safe to repeat.
    pub async fn migrate(&self) -> AppResult<()> {
        let statements = [
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                display_name TEXT,
                password_hash TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                last_active TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS refresh_tokens (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                token TEXT UNIQUE NOT NULL,
                expires_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS habits (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT,
                habit_type TEXT NOT NULL DEFAULT 'binary',
                frequency_period TEXT NOT NULL DEFAULT 'daily',
                times_per_period INTEGER NOT NULL DEFAULT 1,
                target_value INTEGER NOT NULL DEFAULT 1,
                target_unit TEXT NOT NULL DEFAULT 'sessions',
                status TEXT NOT NULL DEFAULT 'ongoing',
                is_archived INTEGER NOT NULL DEFAULT 0,
                end_date TEXT,
                milestone_target INTEGER,
                milestone_current INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT,
                last_completed_at TEXT
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS tags (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT,
                UNIQUE(user_id, name)
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS habit_tags (
                habit_id TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
                tag_id TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                PRIMARY KEY (habit_id, tag_id)
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                habit_id TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
                value INTEGER NOT NULL DEFAULT 0,
                notes TEXT,
                source TEXT NOT NULL DEFAULT 'manual',
                external_id TEXT,
                is_archived INTEGER NOT NULL DEFAULT 0,
                entry_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT
            )
            ",
            r"
            CREATE INDEX IF NOT EXISTS idx_entries_user_date
                ON entries(user_id, entry_date)
            ",
            r"
            CREATE TABLE IF NOT EXISTS github_tokens (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                token TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT
            )
            ",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        }

        Ok(())
    }
}
