use serde::{Deserialize, Serialize};

use super::client::SearchHit;

pub const NO_RESULTS: &str = "No results found";

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    /// Echo of the request query; clients drop responses that no longer match their input.
    pub query: String,
    pub hits: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ReindexResponse {
    pub indexed: usize,
}
