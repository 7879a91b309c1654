// ABOUTME: Tag route handlers for CRUD scoped to the authenticated user
// ABOUTME: Tag names are unique per user; duplicates return 409
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authenticate;
use crate::database::{CreateTagRequest, TagsManager, UpdateTagRequest};
use crate::errors::AppError;
use crate::links::{self, Link, TAG_LINKS};
use crate::models::Tag;
use crate::pagination::{PageParams, PaginationResult};
use crate::server::ServerResources;

/// Maximum tag name length
const MAX_NAME_LEN: usize = 50;
/// Maximum description length
const MAX_DESCRIPTION_LEN: usize = 500;

/// Tag response body
#[derive(Debug, Serialize)]
pub struct TagResponse {
    /// Tag id
    pub id: String,
    /// Tag name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: Option<String>,
    /// Hypermedia links, present when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id.to_string(),
            name: tag.name,
            description: tag.description,
            created_at: tag.created_at.to_rfc3339(),
            updated_at: tag.updated_at.map(|dt| dt.to_rfc3339()),
            links: None,
        }
    }
}

/// Request body for creating or updating a tag
#[derive(Debug, Deserialize)]
pub struct TagBody {
    /// Tag name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
}

/// Query parameters for tag endpoints
#[derive(Debug, Deserialize, Default)]
pub struct TagQuery {
    /// Attach hypermedia links to each tag
    #[serde(default)]
    pub include_links: bool,
    /// 1-based page number
    pub page: Option<u32>,
    /// Items per page
    pub page_size: Option<u32>,
}

/// Tag routes handler
pub struct TagsRoutes;

impl TagsRoutes {
    /// Create all tag routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/tags", get(Self::handle_list))
            .route("/api/tags", post(Self::handle_create))
            .route("/api/tags/:id", get(Self::handle_get))
            .route("/api/tags/:id", put(Self::handle_update))
            .route("/api/tags/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    fn manager(resources: &Arc<ServerResources>) -> TagsManager {
        TagsManager::new(resources.database.pool().clone())
    }

    fn validate(body: &TagBody) -> Result<(), AppError> {
        if body.name.trim().is_empty() || body.name.len() > MAX_NAME_LEN {
            return Err(AppError::invalid_input(format!(
                "Tag name must be 1-{MAX_NAME_LEN} characters"
            )));
        }
        if body
            .description
            .as_ref()
            .is_some_and(|d| d.len() > MAX_DESCRIPTION_LEN)
        {
            return Err(AppError::invalid_input(format!(
                "Tag description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        Ok(())
    }

    /// Handle GET /api/tags
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<TagQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        let tags = Self::manager(&resources).list(auth.user_id).await?;
        let total = tags.len() as u32;

        let params = PageParams {
            page: query.page,
            page_size: query.page_size,
        };
        let page_items: Vec<TagResponse> = tags
            .into_iter()
            .skip(params.offset() as usize)
            .take(params.page_size() as usize)
            .map(|tag| {
                let id = tag.id.to_string();
                let mut response: TagResponse = tag.into();
                if query.include_links {
                    response.links = Some(links::expand(TAG_LINKS, &id));
                }
                response
            })
            .collect();

        let result =
            PaginationResult::new(page_items, params.page(), params.page_size(), total);
        Ok((StatusCode::OK, Json(result)).into_response())
    }

    /// Handle POST /api/tags
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<TagBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        Self::validate(&body)?;

        let request = CreateTagRequest {
            name: body.name.trim().to_owned(),
            description: body.description,
        };
        let tag = Self::manager(&resources).create(auth.user_id, &request).await?;

        let response: TagResponse = tag.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/tags/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Query(query): Query<TagQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        let tag = Self::manager(&resources)
            .get(id, auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Tag {id}")))?;

        let mut response: TagResponse = tag.into();
        if query.include_links {
            response.links = Some(links::expand(TAG_LINKS, &id.to_string()));
        }
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle PUT /api/tags/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<TagBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        Self::validate(&body)?;

        let request = UpdateTagRequest {
            name: body.name.trim().to_owned(),
            description: body.description,
        };
        let tag = Self::manager(&resources)
            .update(id, auth.user_id, &request)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Tag {id}")))?;

        let response: TagResponse = tag.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /api/tags/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;

        let deleted = Self::manager(&resources).delete(id, auth.user_id).await?;
        if !deleted {
            return Err(AppError::not_found(format!("Tag {id}")));
        }

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }
}
