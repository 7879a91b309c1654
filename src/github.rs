// ABOUTME: Typed GitHub API client for the activity-import side feature
// ABOUTME: Fetches the authenticated user's profile and public event stream
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! GitHub client
//!
//! Talks to the GitHub REST API with a user-supplied personal access token.
//! Only the two read endpoints the product needs are wrapped; failures map
//! to `ExternalServiceError`.

use reqwest::header;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// User-agent GitHub requires on every API call
const USER_AGENT: &str = "cadence-api";
/// Accept header for the REST API v3 JSON media type
const ACCEPT: &str = "application/vnd.github+json";

/// Authenticated user's GitHub profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUserProfile {
    /// Account login name
    pub login: String,
    /// Display name, if set
    pub name: Option<String>,
    /// Avatar image URL
    pub avatar_url: String,
    /// Profile bio, if set
    pub bio: Option<String>,
    /// Public repository count
    pub public_repos: u32,
    /// Follower count
    pub followers: u32,
    /// Following count
    pub following: u32,
}

/// One event from a user's public activity stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubEvent {
    /// Event id
    pub id: String,
    /// Event type, e.g. `PushEvent`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Repository the event happened in
    pub repo: GitHubRepository,
    /// Whether the event is public
    pub public: bool,
    /// When the event happened
    pub created_at: String,
}

/// Repository reference inside an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepository {
    /// Repository id
    pub id: u64,
    /// `owner/name` slug
    pub name: String,
    /// API URL of the repository
    pub url: String,
}

/// Client over the GitHub REST API
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a client against the given API base URL
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Fetch the profile of the token's owner (`GET /user`)
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for a rejected token and `ExternalServiceError`
    /// for transport or decoding failures.
    pub async fn get_user_profile(&self, access_token: &str) -> AppResult<GitHubUserProfile> {
        let response = self
            .get(&format!("{}/user", self.base_url), access_token)
            .await?;
        response
            .json()
            .await
            .map_err(|e| AppError::external_service(format!("Invalid GitHub profile body: {e}")))
    }

    /// Fetch a user's public events (`GET /users/{login}/events`)
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for a rejected token and `ExternalServiceError`
    /// for transport or decoding failures.
    pub async fn get_user_events(
        &self,
        access_token: &str,
        login: &str,
        per_page: u32,
    ) -> AppResult<Vec<GitHubEvent>> {
        let url = format!(
            "{}/users/{login}/events?per_page={per_page}",
            self.base_url
        );
        let response = self.get(&url, access_token).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::external_service(format!("Invalid GitHub events body: {e}")))
    }

    async fn get(&self, url: &str, access_token: &str) -> AppResult<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, ACCEPT)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("GitHub request failed: {e}")))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => Err(
                AppError::auth_invalid("GitHub rejected the stored access token"),
            ),
            status => Err(AppError::external_service(format!(
                "GitHub returned {status} for {url}"
            ))),
        }
    }
}
