// ABOUTME: Habit database operations with user scoping and tag management
// ABOUTME: HabitsManager owns habit CRUD, filtered listing, and the habit_tags join
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::users::parse_timestamp;
use crate::errors::{AppError, AppResult};
use crate::models::{
    Frequency, FrequencyPeriod, Habit, HabitStatus, HabitType, Milestone, Tag, Target,
};

/// Date-only storage format
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Request to create a habit
#[derive(Debug, Clone)]
pub struct CreateHabitRequest {
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Binary or measurable
    pub habit_type: HabitType,
    /// Cadence
    pub frequency: Frequency,
    /// Goal per occurrence
    pub target: Target,
    /// Optional end date
    pub end_date: Option<NaiveDate>,
    /// Optional milestone
    pub milestone: Option<Milestone>,
}

/// Request to update a habit (full replacement of mutable fields)
#[derive(Debug, Clone)]
pub struct UpdateHabitRequest {
    /// New name
    pub name: String,
    /// New description
    pub description: Option<String>,
    /// New type
    pub habit_type: HabitType,
    /// New cadence
    pub frequency: Frequency,
    /// New target
    pub target: Target,
    /// New status
    pub status: HabitStatus,
    /// New end date
    pub end_date: Option<NaiveDate>,
    /// New milestone
    pub milestone: Option<Milestone>,
}

/// Filter options for listing habits
#[derive(Debug, Clone, Default)]
pub struct HabitFilter {
    /// Case-insensitive substring match on name/description
    pub search: Option<String>,
    /// Filter by lifecycle status
    pub status: Option<HabitStatus>,
    /// Filter by habit type
    pub habit_type: Option<HabitType>,
    /// Filter by archived state
    pub is_archived: Option<bool>,
}

/// Habit database operations manager
pub struct HabitsManager {
    pool: SqlitePool,
}

impl HabitsManager {
    /// Create a new habits manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new habit for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create(&self, user_id: Uuid, request: &CreateHabitRequest) -> AppResult<Habit> {
        let now = Utc::now();
        let habit = Habit {
            id: Uuid::new_v4(),
            user_id,
            name: request.name.clone(),
            description: request.description.clone(),
            habit_type: request.habit_type,
            frequency: request.frequency,
            target: request.target.clone(),
            status: HabitStatus::Ongoing,
            is_archived: false,
            end_date: request.end_date,
            milestone: request.milestone,
            created_at: now,
            updated_at: None,
            last_completed_at: None,
        };

        sqlx::query(
            r"
            INSERT INTO habits (
                id, user_id, name, description, habit_type,
                frequency_period, times_per_period, target_value, target_unit,
                status, is_archived, end_date, milestone_target, milestone_current,
                created_at, updated_at, last_completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ",
        )
        .bind(habit.id.to_string())
        .bind(habit.user_id.to_string())
        .bind(&habit.name)
        .bind(&habit.description)
        .bind(habit.habit_type.as_str())
        .bind(habit.frequency.period.as_str())
        .bind(habit.frequency.times_per_period)
        .bind(habit.target.value)
        .bind(&habit.target.unit)
        .bind(habit.status.as_str())
        .bind(habit.is_archived)
        .bind(habit.end_date.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(habit.milestone.map(|m| m.target))
        .bind(habit.milestone.map(|m| m.current))
        .bind(habit.created_at.to_rfc3339())
        .bind(Option::<String>::None)
        .bind(Option::<String>::None)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create habit: {e}")))?;

        Ok(habit)
    }

    /// Get a habit by id, scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Habit>> {
        let row = sqlx::query("SELECT * FROM habits WHERE id = $1 AND user_id = $2")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get habit: {e}")))?;

        row.map(|r| row_to_habit(&r)).transpose()
    }

    /// List habits matching a filter, newest first, with limit/offset
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &HabitFilter,
        limit: u32,
        offset: u32,
    ) -> AppResult<Vec<Habit>> {
        let (clauses, binds) = filter_clauses(filter);
        let query = format!(
            "SELECT * FROM habits WHERE user_id = $1{clauses} ORDER BY created_at DESC LIMIT {limit} OFFSET {offset}"
        );

        let mut q = sqlx::query(&query).bind(user_id.to_string());
        for bind in binds {
            q = q.bind(bind);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list habits: {e}")))?;

        rows.iter().map(row_to_habit).collect()
    }

    /// Count habits matching a filter
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count(&self, user_id: Uuid, filter: &HabitFilter) -> AppResult<u32> {
        let (clauses, binds) = filter_clauses(filter);
        let query = format!("SELECT COUNT(*) as n FROM habits WHERE user_id = $1{clauses}");

        let mut q = sqlx::query(&query).bind(user_id.to_string());
        for bind in binds {
            q = q.bind(bind);
        }

        let row = q
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count habits: {e}")))?;
        let n: i64 = row.get("n");
        Ok(n as u32)
    }

    /// Replace a habit's mutable fields
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: &UpdateHabitRequest,
    ) -> AppResult<Option<Habit>> {
        let result = sqlx::query(
            r"
            UPDATE habits SET
                name = $3,
                description = $4,
                habit_type = $5,
                frequency_period = $6,
                times_per_period = $7,
                target_value = $8,
                target_unit = $9,
                status = $10,
                end_date = $11,
                milestone_target = $12,
                milestone_current = $13,
                updated_at = $14
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.habit_type.as_str())
        .bind(request.frequency.period.as_str())
        .bind(request.frequency.times_per_period)
        .bind(request.target.value)
        .bind(&request.target.unit)
        .bind(request.status.as_str())
        .bind(request.end_date.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(request.milestone.map(|m| m.target))
        .bind(request.milestone.map(|m| m.current))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update habit: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id, user_id).await
    }

    /// Patch just the name/description of a habit
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn patch_details(
        &self,
        id: Uuid,
        user_id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<Option<Habit>> {
        let Some(existing) = self.get(id, user_id).await? else {
            return Ok(None);
        };

        let name = name.unwrap_or(&existing.name);
        let description = description.or(existing.description.as_deref());

        sqlx::query(
            "UPDATE habits SET name = $3, description = $4, updated_at = $5 WHERE id = $1 AND user_id = $2",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(name)
        .bind(description)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to patch habit: {e}")))?;

        self.get(id, user_id).await
    }

    /// Stamp the habit as having an entry logged now
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn mark_completed_now(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE habits SET last_completed_at = $3 WHERE id = $1 AND user_id = $2",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to stamp habit completion: {e}")))?;
        Ok(())
    }

    /// Delete a habit (entries and tag links cascade)
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM habits WHERE id = $1 AND user_id = $2")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete habit: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the set of tags attached to a habit.
    ///
    /// Every tag id must belong to the user; the whole request is rejected
    /// otherwise. Already-attached tags outside the new set are removed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a tag id does not exist for the user, or a
    /// database error on other failures.
    pub async fn upsert_tags(
        &self,
        habit_id: Uuid,
        user_id: Uuid,
        tag_ids: &[Uuid],
    ) -> AppResult<()> {
        let requested: HashSet<Uuid> = tag_ids.iter().copied().collect();

        let rows = sqlx::query("SELECT id FROM tags WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load tags: {e}")))?;

        let owned: HashSet<Uuid> = rows
            .iter()
            .filter_map(|r| Uuid::parse_str(&r.get::<String, _>("id")).ok())
            .collect();

        if !requested.is_subset(&owned) {
            return Err(AppError::invalid_input("One or more tag ids are invalid"));
        }

        let current = self.tag_ids_for_habit(habit_id).await?;
        if current == requested {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        for removed in current.difference(&requested) {
            sqlx::query("DELETE FROM habit_tags WHERE habit_id = $1 AND tag_id = $2")
                .bind(habit_id.to_string())
                .bind(removed.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to detach tag: {e}")))?;
        }

        let now = Utc::now().to_rfc3339();
        for added in requested.difference(&current) {
            sqlx::query(
                "INSERT INTO habit_tags (habit_id, tag_id, created_at) VALUES ($1, $2, $3)",
            )
            .bind(habit_id.to_string())
            .bind(added.to_string())
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to attach tag: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit tag update: {e}")))?;
        Ok(())
    }

    /// Remove one tag from a habit
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn remove_tag(&self, habit_id: Uuid, tag_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM habit_tags WHERE habit_id = $1 AND tag_id = $2")
            .bind(habit_id.to_string())
            .bind(tag_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to remove tag: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Tags currently attached to a habit
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn tags_for_habit(&self, habit_id: Uuid) -> AppResult<Vec<Tag>> {
        let rows = sqlx::query(
            r"
            SELECT t.id, t.user_id, t.name, t.description, t.created_at, t.updated_at
            FROM tags t
            JOIN habit_tags ht ON ht.tag_id = t.id
            WHERE ht.habit_id = $1
            ORDER BY t.name
            ",
        )
        .bind(habit_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load habit tags: {e}")))?;

        rows.iter().map(super::tags::row_to_tag).collect()
    }

    async fn tag_ids_for_habit(&self, habit_id: Uuid) -> AppResult<HashSet<Uuid>> {
        let rows = sqlx::query("SELECT tag_id FROM habit_tags WHERE habit_id = $1")
            .bind(habit_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load habit tags: {e}")))?;

        Ok(rows
            .iter()
            .filter_map(|r| Uuid::parse_str(&r.get::<String, _>("tag_id")).ok())
            .collect())
    }
}

/// Build WHERE clauses and bind values for a habit filter. Placeholder
/// numbering starts at $2 ($1 is always the user id).
fn filter_clauses(filter: &HabitFilter) -> (String, Vec<String>) {
    let mut clauses = String::new();
    let mut binds = Vec::new();
    let mut n = 1;

    if let Some(search) = &filter.search {
        n += 1;
        clauses.push_str(&format!(
            " AND (name LIKE ${n} COLLATE NOCASE OR description LIKE ${n} COLLATE NOCASE)"
        ));
        binds.push(format!("%{search}%"));
    }
    if let Some(status) = filter.status {
        n += 1;
        clauses.push_str(&format!(" AND status = ${n}"));
        binds.push(status.as_str().to_owned());
    }
    if let Some(habit_type) = filter.habit_type {
        n += 1;
        clauses.push_str(&format!(" AND habit_type = ${n}"));
        binds.push(habit_type.as_str().to_owned());
    }
    if let Some(is_archived) = filter.is_archived {
        n += 1;
        clauses.push_str(&format!(" AND is_archived = ${n}"));
        binds.push(i32::from(is_archived).to_string());
    }

    (clauses, binds)
}

fn row_to_habit(row: &SqliteRow) -> AppResult<Habit> {
    let id_str: String = row.get("id");
    let user_id_str: String = row.get("user_id");
    let habit_type_str: String = row.get("habit_type");
    let frequency_period_str: String = row.get("frequency_period");
    let status_str: String = row.get("status");
    let end_date_str: Option<String> = row.get("end_date");
    let milestone_target: Option<i32> = row.get("milestone_target");
    let milestone_current: Option<i32> = row.get("milestone_current");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: Option<String> = row.get("updated_at");
    let last_completed_at_str: Option<String> = row.get("last_completed_at");

    let end_date = end_date_str
        .map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map_err(|e| AppError::internal(format!("Invalid date in database: {e}")))
        })
        .transpose()?;

    let milestone = match (milestone_target, milestone_current) {
        (Some(target), current) => Some(Milestone {
            target,
            current: current.unwrap_or(0),
        }),
        _ => None,
    };

    Ok(Habit {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::internal(format!("Invalid habit id UUID: {e}")))?,
        user_id: Uuid::parse_str(&user_id_str)
            .map_err(|e| AppError::internal(format!("Invalid user id UUID: {e}")))?,
        name: row.get("name"),
        description: row.get("description"),
        habit_type: HabitType::parse(&habit_type_str),
        frequency: Frequency {
            period: FrequencyPeriod::parse(&frequency_period_str),
            times_per_period: row.get("times_per_period"),
        },
        target: Target {
            value: row.get("target_value"),
            unit: row.get("target_unit"),
        },
        status: HabitStatus::parse(&status_str),
        is_archived: row.get("is_archived"),
        end_date,
        milestone,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: updated_at_str.as_deref().map(parse_timestamp).transpose()?,
        last_completed_at: last_completed_at_str
            .as_deref()
            .map(parse_timestamp)
            .transpose()?,
    })
}
