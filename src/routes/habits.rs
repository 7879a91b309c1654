// ABOUTME: Habit route handlers: CRUD, partial update, and tag assignment
// ABOUTME: Listing supports filters, pagination, and typed view projections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Habit routes
//!
//! The `view` query parameter selects one of a fixed set of response
//! projections; there is no field-name-driven shaping.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::authenticate;
use crate::database::{
    CreateHabitRequest, HabitFilter, HabitsManager, UpdateHabitRequest,
};
use crate::errors::AppError;
use crate::links::{self, Link, HABIT_LINKS};
use crate::models::{Frequency, Habit, HabitStatus, HabitType, Milestone, Target};
use crate::pagination::{PageParams, PaginationResult};
use crate::server::ServerResources;

/// Name length bounds
const NAME_LEN: std::ops::RangeInclusive<usize> = 3..=100;
/// Maximum description length
const MAX_DESCRIPTION_LEN: usize = 500;
/// Units accepted for measurable habits
const MEASURABLE_UNITS: &[&str] = &[
    "hours", "minutes", "times", "pages", "words", "books", "cal", "km",
];
/// Units accepted for binary habits
const BINARY_UNITS: &[&str] = &["sessions", "tasks"];

/// Typed response projections for habits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitView {
    /// Full habit representation
    #[default]
    Default,
    /// Compact id/name/status projection for pickers
    Summary,
}

/// Full habit response
#[derive(Debug, Serialize)]
pub struct HabitResponse {
    /// Habit id
    pub id: String,
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
    /// Lifecycle status
    pub status: HabitStatus,
    /// Archived flag
    pub is_archived: bool,
    /// Optional end date
    pub end_date: Option<NaiveDate>,
    /// Optional milestone
    pub milestone: Option<Milestone>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: Option<String>,
    /// Last entry timestamp
    pub last_completed_at: Option<String>,
    /// Names of attached tags; populated on single-habit reads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Hypermedia links, present when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
}

impl From<Habit> for HabitResponse {
    fn from(habit: Habit) -> Self {
        Self {
            id: habit.id.to_string(),
            name: habit.name,
            description: habit.description,
            habit_type: habit.habit_type,
            frequency: habit.frequency,
            target: habit.target,
            status: habit.status,
            is_archived: habit.is_archived,
            end_date: habit.end_date,
            milestone: habit.milestone,
            created_at: habit.created_at.to_rfc3339(),
            updated_at: habit.updated_at.map(|dt| dt.to_rfc3339()),
            last_completed_at: habit.last_completed_at.map(|dt| dt.to_rfc3339()),
            tags: None,
            links: None,
        }
    }
}

/// Compact habit projection
#[derive(Debug, Serialize)]
pub struct HabitSummaryResponse {
    /// Habit id
    pub id: String,
    /// Display name
    pub name: String,
    /// Lifecycle status
    pub status: HabitStatus,
    /// Archived flag
    pub is_archived: bool,
}

impl From<Habit> for HabitSummaryResponse {
    fn from(habit: Habit) -> Self {
        Self {
            id: habit.id.to_string(),
            name: habit.name,
            status: habit.status,
            is_archived: habit.is_archived,
        }
    }
}

/// Frequency in request bodies
#[derive(Debug, Deserialize)]
pub struct FrequencyBody {
    /// Period the count applies to
    pub period: crate::models::FrequencyPeriod,
    /// Times per period
    pub times_per_period: i32,
}

/// Target in request bodies
#[derive(Debug, Deserialize)]
pub struct TargetBody {
    /// Amount per occurrence
    pub value: i32,
    /// Unit label
    pub unit: String,
}

/// Milestone in request bodies
#[derive(Debug, Deserialize)]
pub struct MilestoneBody {
    /// Total occurrences to reach
    pub target: i32,
}

/// Request body for creating a habit
#[derive(Debug, Deserialize)]
pub struct CreateHabitBody {
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Binary or measurable
    #[serde(default)]
    pub habit_type: HabitType,
    /// Cadence
    pub frequency: FrequencyBody,
    /// Goal per occurrence
    pub target: TargetBody,
    /// Optional end date
    pub end_date: Option<NaiveDate>,
    /// Optional milestone
    pub milestone: Option<MilestoneBody>,
}

/// Request body for replacing a habit
#[derive(Debug, Deserialize)]
pub struct UpdateHabitBody {
    /// New name
    pub name: String,
    /// New description
    pub description: Option<String>,
    /// New type
    #[serde(default)]
    pub habit_type: HabitType,
    /// New cadence
    pub frequency: FrequencyBody,
    /// New target
    pub target: TargetBody,
    /// New status
    #[serde(default)]
    pub status: HabitStatus,
    /// New end date
    pub end_date: Option<NaiveDate>,
    /// New milestone
    pub milestone: Option<MilestoneBody>,
}

/// Request body for PATCH: only name/description
#[derive(Debug, Deserialize)]
pub struct PatchHabitBody {
    /// New name, if changing
    pub name: Option<String>,
    /// New description, if changing
    pub description: Option<String>,
}

/// Request body replacing the tag set on a habit
#[derive(Debug, Deserialize)]
pub struct UpsertHabitTagsBody {
    /// Complete new set of tag ids
    pub tag_ids: Vec<Uuid>,
}

/// Query parameters for listing habits
#[derive(Debug, Deserialize, Default)]
pub struct HabitsQuery {
    /// Substring search over name/description
    pub search: Option<String>,
    /// Filter by status
    pub status: Option<HabitStatus>,
    /// Filter by type
    pub habit_type: Option<HabitType>,
    /// Filter by archived state
    pub is_archived: Option<bool>,
    /// Response projection
    #[serde(default)]
    pub view: HabitView,
    /// Attach hypermedia links
    #[serde(default)]
    pub include_links: bool,
    /// 1-based page number
    pub page: Option<u32>,
    /// Items per page
    pub page_size: Option<u32>,
}

/// Habit routes handler
pub struct HabitsRoutes;

impl HabitsRoutes {
    /// Create all habit routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/habits", get(Self::handle_list))
            .route("/api/habits", post(Self::handle_create))
            .route("/api/habits/:id", get(Self::handle_get))
            .route("/api/habits/:id", put(Self::handle_update))
            .route("/api/habits/:id", patch(Self::handle_patch))
            .route("/api/habits/:id", delete(Self::handle_delete))
            .route("/api/habits/:id/tags", put(Self::handle_upsert_tags))
            .route(
                "/api/habits/:habit_id/tags/:tag_id",
                delete(Self::handle_remove_tag),
            )
            .with_state(resources)
    }

    fn manager(resources: &Arc<ServerResources>) -> HabitsManager {
        HabitsManager::new(resources.database.pool().clone())
    }

    fn validate(
        name: &str,
        description: Option<&str>,
        habit_type: HabitType,
        frequency: &FrequencyBody,
        target: &TargetBody,
        end_date: Option<NaiveDate>,
        milestone: Option<&MilestoneBody>,
    ) -> Result<(), AppError> {
        if !NAME_LEN.contains(&name.len()) {
            return Err(AppError::invalid_input(
                "Habit name must be between 3 and 100 characters",
            ));
        }
        if description.is_some_and(|d| d.len() > MAX_DESCRIPTION_LEN) {
            return Err(AppError::invalid_input(format!(
                "Habit description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        if frequency.times_per_period <= 0 {
            return Err(AppError::invalid_input(
                "Frequency times per period must be greater than 0",
            ));
        }
        if target.value <= 0 {
            return Err(AppError::invalid_input("Target value must be greater than 0"));
        }

        let unit = target.unit.to_lowercase();
        let allowed = match habit_type {
            HabitType::Binary => BINARY_UNITS,
            HabitType::Measurable => MEASURABLE_UNITS,
        };
        if !allowed.contains(&unit.as_str()) {
            return Err(AppError::invalid_input(format!(
                "Target unit '{}' is not compatible with a {} habit (allowed: {})",
                target.unit,
                habit_type.as_str(),
                allowed.join(", ")
            )));
        }

        if end_date.is_some_and(|d| d <= Utc::now().date_naive()) {
            return Err(AppError::invalid_input("End date must be in the future"));
        }
        if milestone.is_some_and(|m| m.target <= 0) {
            return Err(AppError::invalid_input(
                "Milestone target must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Handle GET /api/habits
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<HabitsQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let manager = Self::manager(&resources);

        let filter = HabitFilter {
            search: query.search.clone(),
            status: query.status,
            habit_type: query.habit_type,
            is_archived: query.is_archived,
        };
        let params = PageParams {
            page: query.page,
            page_size: query.page_size,
        };

        let habits = manager
            .list(auth.user_id, &filter, params.page_size(), params.offset())
            .await?;
        let total = manager.count(auth.user_id, &filter).await?;

        let body = match query.view {
            HabitView::Summary => {
                let items: Vec<HabitSummaryResponse> =
                    habits.into_iter().map(Into::into).collect();
                json!(PaginationResult::new(
                    items,
                    params.page(),
                    params.page_size(),
                    total
                ))
            }
            HabitView::Default => {
                let items: Vec<HabitResponse> = habits
                    .into_iter()
                    .map(|habit| {
                        let id = habit.id.to_string();
                        let mut response: HabitResponse = habit.into();
                        if query.include_links {
                            response.links = Some(links::expand(HABIT_LINKS, &id));
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

        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Handle POST /api/habits
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateHabitBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        Self::validate(
            &body.name,
            body.description.as_deref(),
            body.habit_type,
            &body.frequency,
            &body.target,
            body.end_date,
            body.milestone.as_ref(),
        )?;

        let request = CreateHabitRequest {
            name: body.name,
            description: body.description,
            habit_type: body.habit_type,
            frequency: Frequency {
                period: body.frequency.period,
                times_per_period: body.frequency.times_per_period,
            },
            target: Target {
                value: body.target.value,
                unit: body.target.unit,
            },
            end_date: body.end_date,
            milestone: body.milestone.map(|m| Milestone {
                target: m.target,
                current: 0,
            }),
        };

        let habit = Self::manager(&resources).create(auth.user_id, &request).await?;
        let response: HabitResponse = habit.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/habits/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Query(query): Query<HabitsQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let manager = Self::manager(&resources);

        let habit = manager
            .get(id, auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Habit {id}")))?;

        match query.view {
            HabitView::Summary => {
                let response: HabitSummaryResponse = habit.into();
                Ok((StatusCode::OK, Json(response)).into_response())
            }
            HabitView::Default => {
                let tags = manager.tags_for_habit(id).await?;
                let mut response: HabitResponse = habit.into();
                response.tags = Some(tags.into_iter().map(|t| t.name).collect());
                if query.include_links {
                    response.links = Some(links::expand(HABIT_LINKS, &id.to_string()));
                }
                Ok((StatusCode::OK, Json(response)).into_response())
            }
        }
    }

    /// Handle PUT /api/habits/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<UpdateHabitBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        Self::validate(
            &body.name,
            body.description.as_deref(),
            body.habit_type,
            &body.frequency,
            &body.target,
            body.end_date,
            body.milestone.as_ref(),
        )?;

        let request = UpdateHabitRequest {
            name: body.name,
            description: body.description,
            habit_type: body.habit_type,
            frequency: Frequency {
                period: body.frequency.period,
                times_per_period: body.frequency.times_per_period,
            },
            target: Target {
                value: body.target.value,
                unit: body.target.unit,
            },
            status: body.status,
            end_date: body.end_date,
            milestone: body.milestone.map(|m| Milestone {
                target: m.target,
                current: 0,
            }),
        };

        Self::manager(&resources)
            .update(id, auth.user_id, &request)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Habit {id}")))?;

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    /// Handle PATCH /api/habits/:id
    async fn handle_patch(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<PatchHabitBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        if let Some(name) = &body.name {
            if !NAME_LEN.contains(&name.len()) {
                return Err(AppError::invalid_input(
                    "Habit name must be between 3 and 100 characters",
                ));
            }
        }
        if body
            .description
            .as_ref()
            .is_some_and(|d| d.len() > MAX_DESCRIPTION_LEN)
        {
            return Err(AppError::invalid_input(format!(
                "Habit description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }

        Self::manager(&resources)
            .patch_details(
                id,
                auth.user_id,
                body.name.as_deref(),
                body.description.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Habit {id}")))?;

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    /// Handle DELETE /api/habits/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        let deleted = Self::manager(&resources).delete(id, auth.user_id).await?;
        if !deleted {
            return Err(AppError::not_found(format!("Habit {id}")));
        }

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    /// Handle PUT /api/habits/:id/tags - replace the tag set
    async fn handle_upsert_tags(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<UpsertHabitTagsBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let manager = Self::manager(&resources);

        manager
            .get(id, auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Habit {id}")))?;

        manager.upsert_tags(id, auth.user_id, &body.tag_ids).await?;
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    /// Handle DELETE /api/habits/:habit_id/tags/:tag_id
    async fn handle_remove_tag(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((habit_id, tag_id)): Path<(Uuid, Uuid)>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let manager = Self::manager(&resources);

        manager
            .get(habit_id, auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Habit {habit_id}")))?;

        let removed = manager.remove_tag(habit_id, tag_id).await?;
        if !removed {
            return Err(AppError::not_found(format!(
                "Tag {tag_id} on habit {habit_id}"
            )));
        }

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }
}
