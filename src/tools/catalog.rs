//! In-memory filtering over the full tool collection.

use std::collections::HashMap;

use super::{
    dto::{CatalogFilter, UNCATEGORIZED},
    repo_types::Tool,
};

fn facet_values(raw: Option<&str>) -> Vec<&str> {
    raw.map(|r| r.split(',').map(str::trim).filter(|v| !v.is_empty()).collect())
        .unwrap_or_default()
}

fn facet_matches(selected: &[&str], value: Option<&str>) -> bool {
    selected.is_empty() || value.is_some_and(|v| selected.contains(&v))
}

impl CatalogFilter {
    pub fn is_empty(&self) -> bool {
        self.name.as_deref().map_or(true, |n| n.trim().is_empty())
            && facet_values(self.category.as_deref()).is_empty()
            && facet_values(self.ecosystem.as_deref()).is_empty()
    }

    /// Name is a case-insensitive substring; facets are OR within, AND across.
    pub fn apply(&self, tools: Vec<Tool>) -> Vec<Tool> {
        if self.is_empty() {
            return tools;
        }
        let needle = self
            .name
            .as_deref()
            .map(|n| n.trim().to_lowercase())
            .unwrap_or_default();
        let categories = facet_values(self.category.as_deref());
        let ecosystems = facet_values(self.ecosystem.as_deref());

        tools
            .into_iter()
            .filter(|t| needle.is_empty() || t.name.to_lowercase().contains(&needle))
            .filter(|t| facet_matches(&categories, t.category_id.as_deref()))
            .filter(|t| facet_matches(&ecosystems, t.ecosystem_id.as_deref()))
            .collect()
    }
}

/// Resolve a reference through an id -> name lookup, falling back to "Uncategorized".
pub fn resolve_name(index: &HashMap<String, String>, id: Option<&str>) -> String {
    id.and_then(|id| index.get(id))
        .cloned()
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}
