// ABOUTME: Tag database operations with per-user name uniqueness
// ABOUTME: TagsManager owns tag CRUD scoped to the owning user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::users::parse_timestamp;
use crate::errors::{AppError, AppResult};
use crate::models::Tag;

/// Request to create a tag
#[derive(Debug, Clone)]
pub struct CreateTagRequest {
    /// Tag name (unique per user)
    pub name: String,
    /// Optional description
    pub description: Option<String>,
}

/// Request to update a tag
#[derive(Debug, Clone)]
pub struct UpdateTagRequest {
    /// New name
    pub name: String,
    /// New description
    pub description: Option<String>,
}

/// Tag database operations manager
pub struct TagsManager {
    pool: SqlitePool,
}

impl TagsManager {
    /// Create a new tags manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a tag; names are unique per user
    ///
    /// # Errors
    ///
    /// Returns a conflict error if the user already has a tag with the name,
    /// or a database error on other failures.
    pub async fn create(&self, user_id: Uuid, request: &CreateTagRequest) -> AppResult<Tag> {
        if self.name_exists(user_id, &request.name).await? {
            return Err(AppError::conflict(format!(
                "Tag '{}' already exists",
                request.name
            )));
        }

        let tag = Tag {
            id: Uuid::new_v4(),
            user_id,
            name: request.name.clone(),
            description: request.description.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };

        sqlx::query(
            r"
            INSERT INTO tags (id, user_id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(tag.id.to_string())
        .bind(tag.user_id.to_string())
        .bind(&tag.name)
        .bind(&tag.description)
        .bind(tag.created_at.to_rfc3339())
        .bind(Option::<String>::None)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create tag: {e}")))?;

        Ok(tag)
    }

    /// Get a tag by id, scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Tag>> {
        let row = sqlx::query("SELECT * FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get tag: {e}")))?;

        row.map(|r| row_to_tag(&r)).transpose()
    }

    /// List all tags for a user, alphabetically
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<Tag>> {
        let rows = sqlx::query("SELECT * FROM tags WHERE user_id = $1 ORDER BY name")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list tags: {e}")))?;

        rows.iter().map(row_to_tag).collect()
    }

    /// Update a tag's name and description
    ///
    /// # Errors
    ///
    /// Returns a conflict error if the new name collides with another tag,
    /// or a database error on other failures.
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: &UpdateTagRequest,
    ) -> AppResult<Option<Tag>> {
        let Some(existing) = self.get(id, user_id).await? else {
            return Ok(None);
        };

        if existing.name != request.name && self.name_exists(user_id, &request.name).await? {
            return Err(AppError::conflict(format!(
                "Tag '{}' already exists",
                request.name
            )));
        }

        sqlx::query(
            "UPDATE tags SET name = $3, description = $4, updated_at = $5 WHERE id = $1 AND user_id = $2",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(&request.name)
        .bind(&request.description)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update tag: {e}")))?;

        self.get(id, user_id).await
    }

    /// Delete a tag (habit links cascade)
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete tag: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn name_exists(&self, user_id: Uuid, name: &str) -> AppResult<bool> {
        let row = sqlx::query("SELECT COUNT(*) as n FROM tags WHERE user_id = $1 AND name = $2")
            .bind(user_id.to_string())
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to check tag name: {e}")))?;
        let n: i64 = row.get("n");
        Ok(n > 0)
    }
}

pub(crate) fn row_to_tag(row: &SqliteRow) -> AppResult<Tag> {
    let id_str: String = row.get("id");
    let user_id_str: String = row.get("user_id");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: Option<String> = row.get("updated_at");

    Ok(Tag {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::internal(format!("Invalid tag id UUID: {e}")))?,
        user_id: Uuid::parse_str(&user_id_str)
            .map_err(|e| AppError::internal(format!("Invalid user id UUID: {e}")))?,
        name: row.get("name"),
        description: row.get("description"),
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: updated_at_str.as_deref().map(parse_timestamp).transpose()?,
    })
}
