// ABOUTME: Entry database operations: CRUD, batch insert, filters, archival
// ABOUTME: Also supplies the raw date list consumed by the statistics engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::users::parse_timestamp;
use crate::errors::{AppError, AppResult};
use crate::models::{Entry, EntrySource};

/// Date-only storage format
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Request to create an entry
#[derive(Debug, Clone)]
pub struct CreateEntryRequest {
    /// Habit the entry belongs to
    pub habit_id: Uuid,
    /// Recorded amount (>= 0)
    pub value: i32,
    /// Optional notes
    pub notes: Option<String>,
    /// Origin of the entry
    pub source: EntrySource,
    /// External correlation id for automated imports
    pub external_id: Option<String>,
    /// Calendar date the progress applies to
    pub date: NaiveDate,
}

/// Request to update an entry
#[derive(Debug, Clone)]
pub struct UpdateEntryRequest {
    /// New value
    pub value: i32,
    /// New notes
    pub notes: Option<String>,
    /// New date
    pub date: NaiveDate,
}

/// Sort orders for the entries listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySort {
    /// Most recent date first
    #[default]
    DateDesc,
    /// Oldest date first
    DateAsc,
    /// Most recently created first
    CreatedAtDesc,
    /// Oldest created first
    CreatedAtAsc,
}

impl EntrySort {
    /// ORDER BY clause fragment for this sort
    #[must_use]
    pub const fn order_clause(self) -> &'static str {
        match self {
            Self::DateDesc => "entry_date DESC, created_at DESC",
            Self::DateAsc => "entry_date ASC, created_at ASC",
            Self::CreatedAtDesc => "created_at DESC",
            Self::CreatedAtAsc => "created_at ASC",
        }
    }
}

/// Filter options for listing entries
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Restrict to one habit
    pub habit_id: Option<Uuid>,
    /// Earliest date, inclusive
    pub from_date: Option<NaiveDate>,
    /// Latest date, inclusive
    pub to_date: Option<NaiveDate>,
    /// Filter by origin
    pub source: Option<EntrySource>,
    /// Filter by archived state
    pub is_archived: Option<bool>,
}

/// Entry database operations manager
pub struct EntriesManager {
    pool: SqlitePool,
}

impl EntriesManager {
    /// Create a new entries manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an entry for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create(&self, user_id: Uuid, request: &CreateEntryRequest) -> AppResult<Entry> {
        let entry = build_entry(user_id, request);
        insert_entry(&self.pool, &entry).await?;
        Ok(entry)
    }

    /// Create several entries atomically: either the whole batch inserts or
    /// none of it does.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert or the commit fails
    pub async fn create_batch(
        &self,
        user_id: Uuid,
        requests: &[CreateEntryRequest],
    ) -> AppResult<Vec<Entry>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let mut created = Vec::with_capacity(requests.len());
        for request in requests {
            let entry = build_entry(user_id, request);
            bind_entry_insert(&entry)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to create entry: {e}")))?;
            created.push(entry);
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit entry batch: {e}")))?;

        Ok(created)
    }

    /// Get an entry by id, scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Entry>> {
        let row = sqlx::query("SELECT * FROM entries WHERE id = $1 AND user_id = $2")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get entry: {e}")))?;

        row.map(|r| row_to_entry(&r)).transpose()
    }

    /// List entries matching a filter with sort and limit/offset
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &EntryFilter,
        sort: EntrySort,
        limit: u32,
        offset: u32,
    ) -> AppResult<Vec<Entry>> {
        let (clauses, binds) = filter_clauses(filter);
        let query = format!(
            "SELECT * FROM entries WHERE user_id = $1{clauses} ORDER BY {} LIMIT {limit} OFFSET {offset}",
            sort.order_clause()
        );

        let mut q = sqlx::query(&query).bind(user_id.to_string());
        for bind in binds {
            q = q.bind(bind);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list entries: {e}")))?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Count entries matching a filter
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count(&self, user_id: Uuid, filter: &EntryFilter) -> AppResult<u32> {
        let (clauses, binds) = filter_clauses(filter);
        let query = format!("SELECT COUNT(*) as n FROM entries WHERE user_id = $1{clauses}");

        let mut q = sqlx::query(&query).bind(user_id.to_string());
        for bind in binds {
            q = q.bind(bind);
        }

        let row = q
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count entries: {e}")))?;
        let n: i64 = row.get("n");
        Ok(n as u32)
    }

    /// Update an entry's value, notes, and date
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: &UpdateEntryRequest,
    ) -> AppResult<Option<Entry>> {
        let result = sqlx::query(
            r"
            UPDATE entries SET value = $3, notes = $4, entry_date = $5, updated_at = $6
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(request.value)
        .bind(&request.notes)
        .bind(request.date.format(DATE_FORMAT).to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update entry: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id, user_id).await
    }

    /// Set an entry's archived flag
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn set_archived(
        &self,
        id: Uuid,
        user_id: Uuid,
        archived: bool,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE entries SET is_archived = $3, updated_at = $4 WHERE id = $1 AND user_id = $2",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(archived)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to archive entry: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an entry
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE id = $1 AND user_id = $2")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete entry: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Every entry date for a user, one element per entry, ascending.
    /// This is the statistics engine's input; archived entries count too.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn entry_dates(&self, user_id: Uuid) -> AppResult<Vec<NaiveDate>> {
        let rows = sqlx::query(
            "SELECT entry_date FROM entries WHERE user_id = $1 ORDER BY entry_date",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load entry dates: {e}")))?;

        rows.iter()
            .map(|r| {
                let raw: String = r.get("entry_date");
                NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                    .map_err(|e| AppError::internal(format!("Invalid date in database: {e}")))
            })
            .collect()
    }
}

fn build_entry(user_id: Uuid, request: &CreateEntryRequest) -> Entry {
    Entry {
        id: Uuid::new_v4(),
        user_id,
        habit_id: request.habit_id,
        value: request.value,
        notes: request.notes.clone(),
        source: request.source,
        external_id: request.external_id.clone(),
        is_archived: false,
        date: request.date,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn bind_entry_insert(
    entry: &Entry,
) -> sqlx::query::Query<'_, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    sqlx::query(
        r"
        INSERT INTO entries (
            id, user_id, habit_id, value, notes, source, external_id,
            is_archived, entry_date, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ",
    )
    .bind(entry.id.to_string())
    .bind(entry.user_id.to_string())
    .bind(entry.habit_id.to_string())
    .bind(entry.value)
    .bind(entry.notes.clone())
    .bind(entry.source.as_str())
    .bind(entry.external_id.clone())
    .bind(entry.is_archived)
    .bind(entry.date.format(DATE_FORMAT).to_string())
    .bind(entry.created_at.to_rfc3339())
    .bind(Option::<String>::None)
}

async fn insert_entry(pool: &SqlitePool, entry: &Entry) -> AppResult<()> {
    bind_entry_insert(entry)
        .execute(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create entry: {e}")))?;
    Ok(())
}

/// Build WHERE clauses and bind values for an entry filter. Placeholder
/// numbering starts at $2 ($1 is always the user id).
fn filter_clauses(filter: &EntryFilter) -> (String, Vec<String>) {
    let mut clauses = String::new();
    let mut binds = Vec::new();
    let mut n = 1;

    if let Some(habit_id) = filter.habit_id {
        n += 1;
        clauses.push_str(&format!(" AND habit_id = ${n}"));
        binds.push(habit_id.to_string());
    }
    if let Some(from_date) = filter.from_date {
        n += 1;
        clauses.push_str(&format!(" AND entry_date >= ${n}"));
        binds.push(from_date.format(DATE_FORMAT).to_string());
    }
    if let Some(to_date) = filter.to_date {
        n += 1;
        clauses.push_str(&format!(" AND entry_date <= ${n}"));
        binds.push(to_date.format(DATE_FORMAT).to_string());
    }
    if let Some(source) = filter.source {
        n += 1;
        clauses.push_str(&format!(" AND source = ${n}"));
        binds.push(source.as_str().to_owned());
    }
    if let Some(is_archived) = filter.is_archived {
        n += 1;
        clauses.push_str(&format!(" AND is_archived = ${n}"));
        binds.push(i32::from(is_archived).to_string());
    }

    (clauses, binds)
}

fn row_to_entry(row: &SqliteRow) -> AppResult<Entry> {
    let id_str: String = row.get("id");
    let user_id_str: String = row.get("user_id");
    let habit_id_str: String = row.get("habit_id");
    let source_str: String = row.get("source");
    let date_str: String = row.get("entry_date");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: Option<String> = row.get("updated_at");

    Ok(Entry {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::internal(format!("Invalid entry id UUID: {e}")))?,
        user_id: Uuid::parse_str(&user_id_str)
            .map_err(|e| AppError::internal(format!("Invalid user id UUID: {e}")))?,
        habit_id: Uuid::parse_str(&habit_id_str)
            .map_err(|e| AppError::internal(format!("Invalid habit id UUID: {e}")))?,
        value: row.get("value"),
        notes: row.get("notes"),
        source: EntrySource::parse(&source_str),
        external_id: row.get("external_id"),
        is_archived: row.get("is_archived"),
        date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .map_err(|e| AppError::internal(format!("Invalid date in database: {e}")))?,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: updated_at_str.as_deref().map(parse_timestamp).transpose()?,
    })
}
