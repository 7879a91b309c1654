// ABOUTME: Entry route handlers: CRUD, batch creation, archival, and statistics
// ABOUTME: The stats endpoint is the HTTP face of the entry statistics engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Entry routes
//!
//! Entries are always scoped to the authenticated user. The `/stats`
//! endpoint fetches the user's full entry-date history (archived entries
//! included) and hands it to [`StatsCalculator`] with today's UTC date.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::authenticate;
use crate::database::{
    CreateEntryRequest, EntriesManager, EntryFilter, EntrySort, HabitsManager,
    UpdateEntryRequest,
};
use crate::errors::AppError;
use crate::intelligence::StatsCalculator;
use crate::links::{self, entry_links, Link, ENTRIES_COLLECTION_LINKS};
use crate::models::{Entry, EntrySource};
use crate::pagination::{PageParams, PaginationResult};
use crate::server::ServerResources;

/// Maximum notes length
const MAX_NOTES_LEN: usize = 1000;
/// Maximum entries per batch request
const MAX_BATCH_SIZE: usize = 20;

/// Typed response projections for entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryView {
    /// Full entry representation
    #[default]
    Default,
    /// Compact id/habit/value/date projection for calendars
    Summary,
}

/// Full entry response
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    /// Entry id
    pub id: String,
    /// Habit the entry belongs to
    pub habit_id: String,
    /// Recorded amount
    pub value: i32,
    /// Optional notes
    pub notes: Option<String>,
    /// Manual or automated origin
    pub source: EntrySource,
    /// External correlation id
    pub external_id: Option<String>,
    /// Archived flag
    pub is_archived: bool,
    /// Calendar date of the progress
    pub date: NaiveDate,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: Option<String>,
    /// Hypermedia links, present when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
}

impl From<Entry> for EntryResponse {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id.to_string(),
            habit_id: entry.habit_id.to_string(),
            value: entry.value,
            notes: entry.notes,
            source: entry.source,
            external_id: entry.external_id,
            is_archived: entry.is_archived,
            date: entry.date,
            created_at: entry.created_at.to_rfc3339(),
            updated_at: entry.updated_at.map(|dt| dt.to_rfc3339()),
            links: None,
        }
    }
}

/// Compact entry projection
#[derive(Debug, Serialize)]
pub struct EntrySummaryResponse {
    /// Entry id
    pub id: String,
    /// Habit the entry belongs to
    pub habit_id: String,
    /// Recorded amount
    pub value: i32,
    /// Calendar date of the progress
    pub date: NaiveDate,
}

impl From<Entry> for EntrySummaryResponse {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id.to_string(),
            habit_id: entry.habit_id.to_string(),
            value: entry.value,
            date: entry.date,
        }
    }
}

/// Request body for creating an entry
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntryBody {
    /// Habit to log against
    pub habit_id: Uuid,
    /// Recorded amount (>= 0)
    pub value: i32,
    /// Optional notes
    pub notes: Option<String>,
    /// Calendar date (defaults handled by client; must not be in the future)
    pub date: NaiveDate,
}

/// Request body for batch entry creation
#[derive(Debug, Deserialize)]
pub struct CreateEntryBatchBody {
    /// Entries to create; the batch is all-or-nothing
    pub entries: Vec<CreateEntryBody>,
}

/// Request body for updating an entry
#[derive(Debug, Deserialize)]
pub struct UpdateEntryBody {
    /// New value
    pub value: i32,
    /// New notes
    pub notes: Option<String>,
    /// New date
    pub date: NaiveDate,
}

/// Query parameters for listing entries
#[derive(Debug, Deserialize, Default)]
pub struct EntriesQuery {
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
    /// Sort order
    #[serde(default)]
    pub sort: EntrySort,
    /// Response projection
    #[serde(default)]
    pub view: EntryView,
    /// Attach hypermedia links
    #[serde(default)]
    pub include_links: bool,
    /// 1-based page number
    pub page: Option<u32>,
    /// Items per page
    pub page_size: Option<u32>,
}

/// Entry routes handler
pub struct EntriesRoutes;

impl EntriesRoutes {
    /// Create all entry routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/entries", get(Self::handle_list))
            .route("/api/entries", post(Self::handle_create))
            .route("/api/entries/batch", post(Self::handle_create_batch))
            .route("/api/entries/stats", get(Self::handle_stats))
            .route("/api/entries/:id", get(Self::handle_get))
            .route("/api/entries/:id", put(Self::handle_update))
            .route("/api/entries/:id", delete(Self::handle_delete))
            .route("/api/entries/:id/archive", put(Self::handle_archive))
            .route("/api/entries/:id/unarchive", put(Self::handle_unarchive))
            .with_state(resources)
    }

    fn manager(resources: &Arc<ServerResources>) -> EntriesManager {
        EntriesManager::new(resources.database.pool().clone())
    }

    fn validate(value: i32, notes: Option<&str>, date: NaiveDate) -> Result<(), AppError> {
        if value < 0 {
            return Err(AppError::invalid_input(
                "Entry value must be greater than or equal to 0",
            ));
        }
        if notes.is_some_and(|n| n.len() > MAX_NOTES_LEN) {
            return Err(AppError::invalid_input(format!(
                "Entry notes must be at most {MAX_NOTES_LEN} characters"
            )));
        }
        if date > Utc::now().date_naive() {
            return Err(AppError::invalid_input("Entry date cannot be in the future"));
        }
        Ok(())
    }

    /// Handle GET /api/entries
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<EntriesQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let manager = Self::manager(&resources);

        let filter = EntryFilter {
            habit_id: query.habit_id,
            from_date: query.from_date,
            to_date: query.to_date,
            source: query.source,
            is_archived: query.is_archived,
        };
        let params = PageParams {
            page: query.page,
            page_size: query.page_size,
        };

        let entries = manager
            .list(
                auth.user_id,
                &filter,
                query.sort,
                params.page_size(),
                params.offset(),
            )
            .await?;
        let total = manager.count(auth.user_id, &filter).await?;

        let mut body = match query.view {
            EntryView::Summary => {
                let items: Vec<EntrySummaryResponse> =
                    entries.into_iter().map(Into::into).collect();
                json!(PaginationResult::new(
                    items,
                    params.page(),
                    params.page_size(),
                    total
                ))
            }
            EntryView::Default => {
                let items: Vec<EntryResponse> = entries
                    .into_iter()
                    .map(|entry| {
                        let id = entry.id.to_string();
                        let archived = entry.is_archived;
                        let mut response: EntryResponse = entry.into();
                        if query.include_links {
                            response.links = Some(links::expand(entry_links(archived), &id));
                        }
                        response
                    })
                    .collect();
                json!(PaginationResult::new(
                    items,
                    params.page(),
                    params.page_size(),
                    total
                ))
            }
        };

        if query.include_links {
            if let Some(object) = body.as_object_mut() {
                object.insert(
                    "links".to_owned(),
                    json!(links::expand_collection(ENTRIES_COLLECTION_LINKS)),
                );
            }
        }

        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Handle GET /api/entries/stats - aggregate statistics and streaks
    async fn handle_stats(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        let dates = Self::manager(&resources).entry_dates(auth.user_id).await?;
        let today = Utc::now().date_naive();
        let stats = StatsCalculator::compute(&dates, today);

        Ok((StatusCode::OK, Json(stats)).into_response())
    }

    /// Handle POST /api/entries
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateEntryBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        Self::validate(body.value, body.notes.as_deref(), body.date)?;

        let habits = HabitsManager::new(resources.database.pool().clone());
        habits
            .get(body.habit_id, auth.user_id)
            .await?
            .ok_or_else(|| {
                AppError::invalid_input(format!("Habit {} does not exist", body.habit_id))
            })?;

        let request = CreateEntryRequest {
            habit_id: body.habit_id,
            value: body.value,
            notes: body.notes,
            source: EntrySource::Manual,
            external_id: None,
            date: body.date,
        };
        let entry = Self::manager(&resources).create(auth.user_id, &request).await?;
        habits.mark_completed_now(body.habit_id, auth.user_id).await?;

        let response: EntryResponse = entry.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle POST /api/entries/batch
    async fn handle_create_batch(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateEntryBatchBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        if body.entries.is_empty() {
            return Err(AppError::invalid_input("At least one entry is required"));
        }
        if body.entries.len() > MAX_BATCH_SIZE {
            return Err(AppError::invalid_input(format!(
                "Maximum of {MAX_BATCH_SIZE} entries per batch"
            )));
        }
        for entry in &body.entries {
            Self::validate(entry.value, entry.notes.as_deref(), entry.date)?;
        }

        // Validate the full habit set before inserting anything
        let habits = HabitsManager::new(resources.database.pool().clone());
        let habit_ids: HashSet<Uuid> = body.entries.iter().map(|e| e.habit_id).collect();
        for habit_id in &habit_ids {
            habits.get(*habit_id, auth.user_id).await?.ok_or_else(|| {
                AppError::invalid_input("One or more habit ids are invalid")
            })?;
        }

        let requests: Vec<CreateEntryRequest> = body
            .entries
            .into_iter()
            .map(|e| CreateEntryRequest {
                habit_id: e.habit_id,
                value: e.value,
                notes: e.notes,
                source: EntrySource::Manual,
                external_id: None,
                date: e.date,
            })
            .collect();

        let created = Self::manager(&resources)
            .create_batch(auth.user_id, &requests)
            .await?;
        for habit_id in habit_ids {
            habits.mark_completed_now(habit_id, auth.user_id).await?;
        }

        let responses: Vec<EntryResponse> = created.into_iter().map(Into::into).collect();
        Ok((StatusCode::CREATED, Json(responses)).into_response())
    }

    /// Handle GET /api/entries/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Query(query): Query<EntriesQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        let entry = Self::manager(&resources)
            .get(id, auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Entry {id}")))?;

        match query.view {
            EntryView::Summary => {
                let response: EntrySummaryResponse = entry.into();
                Ok((StatusCode::OK, Json(response)).into_response())
            }
            EntryView::Default => {
                let archived = entry.is_archived;
                let mut response: EntryResponse = entry.into();
                if query.include_links {
                    response.links =
                        Some(links::expand(entry_links(archived), &id.to_string()));
                }
                Ok((StatusCode::OK, Json(response)).into_response())
            }
        }
    }

    /// Handle PUT /api/entries/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<UpdateEntryBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        Self::validate(body.value, body.notes.as_deref(), body.date)?;

        let request = UpdateEntryRequest {
            value: body.value,
            notes: body.notes,
            date: body.date,
        };
        Self::manager(&resources)
            .update(id, auth.user_id, &request)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Entry {id}")))?;

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    /// Handle PUT /api/entries/:id/archive
    async fn handle_archive(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        Self::set_archived(resources, headers, id, true).await
    }

    /// Handle PUT /api/entries/:id/unarchive
    async fn handle_unarchive(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        Self::set_archived(resources, headers, id, false).await
    }

    async fn set_archived(
        resources: Arc<ServerResources>,
        headers: HeaderMap,
        id: Uuid,
        archived: bool,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        let changed = Self::manager(&resources)
            .set_archived(id, auth.user_id, archived)
            .await?;
        if !changed {
            return Err(AppError::not_found(format!("Entry {id}")));
        }

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    /// Handle DELETE /api/entries/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        let deleted = Self::manager(&resources).delete(id, auth.user_id).await?;
        if !deleted {
            return Err(AppError::not_found(format!("Entry {id}")));
        }

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }
}
