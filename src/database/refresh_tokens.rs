// ABOUTME: Refresh token storage, lookup, rotation, and revocation
// ABOUTME: Registration writes user + token in a single transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::users::parse_timestamp;
use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{RefreshToken, User};

impl Database {
    /// Create the user and their first refresh token in one transaction.
    ///
    /// Either both rows commit or neither does; a half-registered account
    /// (user without a session, or vice versa) can never exist.
    ///
    /// # Errors
    ///
    /// Returns a conflict error for duplicate emails, or a database error on
    /// other failures.
    pub async fn register_user(
        &self,
        user: &User,
        token: &str,
        token_days: i64,
    ) -> AppResult<RefreshToken> {
        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(AppError::conflict("Email already in use"));
        }

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO users (
                id, email, display_name, password_hash, is_admin, created_at, last_active
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.created_at.to_rfc3339())
        .bind(user.last_active.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create user: {e}")))?;

        let refresh = new_refresh_token(user.id, token, token_days);
        insert_refresh_token(&mut tx, &refresh).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit registration: {e}")))?;

        Ok(refresh)
    }

    /// Store a refresh token for an existing user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn create_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        token_days: i64,
    ) -> AppResult<RefreshToken> {
        let refresh = new_refresh_token(user_id, token, token_days);

        sqlx::query(
            r"
            INSERT INTO refresh_tokens (id, user_id, token, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(refresh.id.to_string())
        .bind(refresh.user_id.to_string())
        .bind(&refresh.token)
        .bind(refresh.expires_at.to_rfc3339())
        .bind(refresh.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to store refresh token: {e}")))?;

        Ok(refresh)
    }

    /// Look up a refresh token by its opaque value
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_refresh_token(&self, token: &str) -> AppResult<Option<RefreshToken>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, token, expires_at, created_at
            FROM refresh_tokens WHERE token = $1
            ",
        )
        .bind(token)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to look up refresh token: {e}")))?;

        row.map(|r| row_to_refresh_token(&r)).transpose()
    }

    /// Replace a refresh token's value and push out its expiry (rotation)
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn rotate_refresh_token(
        &self,
        id: Uuid,
        new_token: &str,
        token_days: i64,
    ) -> AppResult<()> {
        let expires_at = Utc::now() + Duration::days(token_days);
        sqlx::query("UPDATE refresh_tokens SET token = $2, expires_at = $3 WHERE id = $1")
            .bind(id.to_string())
            .bind(new_token)
            .bind(expires_at.to_rfc3339())
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to rotate refresh token: {e}")))?;
        Ok(())
    }

    /// Delete refresh tokens that expired before `now`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn prune_expired_refresh_tokens(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(now.to_rfc3339())
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to prune refresh tokens: {e}")))?;
        Ok(result.rows_affected())
    }
}

fn new_refresh_token(user_id: Uuid, token: &str, token_days: i64) -> RefreshToken {
    let now = Utc::now();
    RefreshToken {
        id: Uuid::new_v4(),
        user_id,
        token: token.to_owned(),
        expires_at: now + Duration::days(token_days),
        created_at: now,
    }
}

async fn insert_refresh_token(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    refresh: &RefreshToken,
) -> AppResult<()> {
    sqlx::query(
        r"
        INSERT INTO refresh_tokens (id, user_id, token, expires_at, created_at)
        VALUES ($1, $2, $3, $4, $5)
        ",
    )
    .bind(refresh.id.to_string())
    .bind(refresh.user_id.to_string())
    .bind(&refresh.token)
    .bind(refresh.expires_at.to_rfc3339())
    .bind(refresh.created_at.to_rfc3339())
    .execute(&mut **tx)
    .await
    .map_err(|e| AppError::database(format!("Failed to store refresh token: {e}")))?;
    Ok(())
}

fn row_to_refresh_token(row: &SqliteRow) -> AppResult<RefreshToken> {
    let id_str: String = row.get("id");
    let user_id_str: String = row.get("user_id");
    let expires_at_str: String = row.get("expires_at");
    let created_at_str: String = row.get("created_at");

    Ok(RefreshToken {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::internal(format!("Invalid token id UUID: {e}")))?,
        user_id: Uuid::parse_str(&user_id_str)
            .map_err(|e| AppError::internal(format!("Invalid user id UUID: {e}")))?,
        token: row.get("token"),
        expires_at: parse_timestamp(&expires_at_str)?,
        created_at: parse_timestamp(&created_at_str)?,
    })
}
