use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Tool row. `category_id`/`ecosystem_id` are plain foreign keys; `None` once the
/// referenced row has been removed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tool {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category_id: Option<String>,
    pub ecosystem_id: Option<String>,
    pub github_link: Option<String>,
    pub github_stars: Option<i64>,
    pub website_url: String,
    pub logo_url: String,
    pub badges: Vec<String>,
    pub like_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated tool fields ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDraft {
    pub name: String,
    pub description: String,
    pub category_id: String,
    pub ecosystem_id: String,
    pub github_link: Option<String>,
    pub github_stars: Option<i64>,
    pub website_url: String,
    pub logo_url: String,
    pub badges: Vec<String>,
}

/// What went away with a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedTool {
    pub likes: u64,
    pub comments: u64,
    /// Logo of the removed row, for cleanup after commit.
    pub logo_url: String,
}
