// ABOUTME: Core domain models for users, habits, tags, and entries
// ABOUTME: Enums carry as_str/parse pairs matching their database string encodings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Domain model types shared between the database layer and the routes

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Email address (unique)
    pub email: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Bcrypt password hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether this user has admin privileges
    pub is_admin: bool,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last authenticated activity
    pub last_active: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh id and current timestamps
    #[must_use]
    pub fn new(email: String, password_hash: String, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            display_name,
            password_hash,
            is_admin: false,
            created_at: now,
            last_active: now,
        }
    }
}

/// Whether a habit is tracked as done/not-done or by a measured quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HabitType {
    /// Done or not done per day
    #[default]
    Binary,
    /// Tracked with a numeric value against a target
    Measurable,
}

impl HabitType {
    /// Database string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Measurable => "measurable",
        }
    }

    /// Parse from database string, defaulting unknown values to binary
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "measurable" => Self::Measurable,
            _ => Self::Binary,
        }
    }
}

/// Calendar period over which a habit's frequency is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyPeriod {
    /// Once per day cadence
    #[default]
    Daily,
    /// Counted per week
    Weekly,
    /// Counted per month
    Monthly,
}

impl FrequencyPeriod {
    /// Database string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Parse from database string, defaulting unknown values to daily
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            _ => Self::Daily,
        }
    }
}

/// How often the habit should be performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    /// Period the count applies to
    pub period: FrequencyPeriod,
    /// Times per period (must be > 0)
    pub times_per_period: i32,
}

/// Quantified goal for a habit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Amount per occurrence (must be > 0)
    pub value: i32,
    /// Unit label, e.g. "minutes", "pages", "sessions"
    pub unit: String,
}

/// Long-running progress marker on a habit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Total occurrences to reach
    pub target: i32,
    /// Occurrences logged so far
    pub current: i32,
}

/// Lifecycle state of a habit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HabitStatus {
    /// Being actively tracked
    #[default]
    Ongoing,
    /// Goal reached, kept for history
    Completed,
}

impl HabitStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
        }
    }

    /// Parse from database string, defaulting unknown values to ongoing
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => Self::Completed,
            _ => Self::Ongoing,
        }
    }
}

/// A habit the user is tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Binary or measurable
    pub habit_type: HabitType,
    /// Cadence the habit is performed at
    pub frequency: Frequency,
    /// Quantified goal per occurrence
    pub target: Target,
    /// Lifecycle state
    pub status: HabitStatus,
    /// Whether the habit is archived (hidden from default listings)
    pub is_archived: bool,
    /// Optional date after which the habit ends
    pub end_date: Option<NaiveDate>,
    /// Optional long-running milestone
    pub milestone: Option<Milestone>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
    /// When an entry was last logged against this habit
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// A user-defined label attachable to habits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Name, unique per user
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

/// Where an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    /// Logged by the user through the API
    #[default]
    Manual,
    /// Imported by an automation (e.g. the GitHub activity import)
    Automation,
}

impl EntrySource {
    /// Database string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automation => "automation",
        }
    }

    /// Parse from database string, defaulting unknown values to manual
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "automation" => Self::Automation,
            _ => Self::Manual,
        }
    }
}

/// A single logged occurrence of progress on a habit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Habit this entry belongs to
    pub habit_id: Uuid,
    /// Recorded amount (>= 0)
    pub value: i32,
    /// Optional free-text notes
    pub notes: Option<String>,
    /// Manual or automated origin
    pub source: EntrySource,
    /// External correlation id for automated imports
    pub external_id: Option<String>,
    /// Whether the entry is archived
    pub is_archived: bool,
    /// Calendar date the progress applies to (day granularity)
    pub date: NaiveDate,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

/// A refresh token granting a new access token
#[derive(Debug, Clone)]
pub struct RefreshToken {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Opaque token value
    pub token: String,
    /// Expiry; tokens past this point are rejected
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
