// ABOUTME: GitHub personal access token storage per user
// ABOUTME: One token per user; storing replaces, revoking deletes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::errors::{AppError, AppResult};

impl Database {
    /// Store (or replace) a user's GitHub personal access token
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn store_github_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO github_tokens (user_id, token, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(user_id) DO UPDATE SET
                token = excluded.token,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at
            ",
        )
        .bind(user_id.to_string())
        .bind(token)
        .bind(Utc::now().to_rfc3339())
        .bind(expires_at.map(|dt| dt.to_rfc3339()))
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to store GitHub token: {e}")))?;
        Ok(())
    }

    /// Fetch a user's GitHub token if one is stored
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_github_token(&self, user_id: Uuid) -> AppResult<Option<String>> {
        let row = sqlx::query("SELECT token FROM github_tokens WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to get GitHub token: {e}")))?;

        Ok(row.map(|r| r.get("token")))
    }

    /// Delete a user's GitHub token
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn revoke_github_token(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM github_tokens WHERE user_id = $1")
            .bind(user_id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to revoke GitHub token: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
