use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::Tool;
use crate::taxonomy::Term;

/// Display name used when a tool's category or ecosystem cannot be resolved.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Admin add/edit form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub ecosystem: String,
    /// The tool has no public repository; both GitHub fields must then be null.
    #[serde(default)]
    pub no_github_repo: bool,
    #[serde(default)]
    pub github_link: Option<String>,
    #[serde(default)]
    pub github_stars: Option<i64>,
    #[serde(default)]
    pub website_url: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub badges: Vec<String>,
}

/// Faceted filter over the full catalog. Facets take comma-separated ids.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub ecosystem: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub tools: Vec<Tool>,
    pub categories: Vec<Term>,
    pub ecosystems: Vec<Term>,
}

#[derive(Debug, Serialize)]
pub struct ToolDetails {
    #[serde(flatten)]
    pub tool: Tool,
    pub category_name: String,
    pub ecosystem_name: String,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteToolResponse {
    pub id: Uuid,
    pub likes_deleted: u64,
    pub comments_deleted: u64,
}
