use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::config::SearchConfig;

const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";
pub const QUERY_BY: &str = "name,category,badges";

/// Document shape stored in the search collection, one per tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    pub name: String,
    /// Category display name, so the index can match on it.
    pub category: String,
    pub badges: Vec<String>,
    pub description: String,
    pub logo_url: String,
    pub like_count: i64,
}

/// One search result as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub category: String,
    pub badges: Vec<String>,
    pub logo_url: String,
}

impl From<SearchDocument> for SearchHit {
    fn from(d: SearchDocument) -> Self {
        Self {
            id: d.id,
            name: d.name,
            category: d.category,
            badges: d.badges,
            logo_url: d.logo_url,
        }
    }
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<SearchHit>>;
    async fn upsert_tool(&self, doc: &SearchDocument) -> anyhow::Result<()>;
    async fn delete_tool(&self, tool_id: Uuid) -> anyhow::Result<()>;
    /// Create the collection when it does not exist yet.
    async fn ensure_collection(&self) -> anyhow::Result<()>;
}

/// Hosted Typesense collection reached over its REST API.
#[derive(Clone)]
pub struct TypesenseClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
    collection: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    document: SearchDocument,
}

impl TypesenseClient {
    pub fn new(cfg: &SearchConfig, http: reqwest::Client) -> anyhow::Result<Self> {
        let base = Url::parse(&cfg.url).with_context(|| format!("invalid TYPESENSE_URL {}", cfg.url))?;
        Ok(Self {
            http,
            base,
            api_key: cfg.api_key.clone(),
            collection: cfg.collection.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("TYPESENSE_URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn build_search_request(&self, query: &str, limit: usize) -> anyhow::Result<reqwest::Request> {
        let url = self.endpoint(&["collections", &self.collection, "documents", "search"])?;
        let per_page = limit.to_string();
        let req = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[
                ("q", query),
                ("query_by", QUERY_BY),
                ("prefix", "true"),
                ("num_typos", "2"),
                ("per_page", per_page.as_str()),
            ])
            .build()?;
        Ok(req)
    }

    fn collection_schema(&self) -> serde_json::Value {
        json!({
            "name": self.collection,
            "fields": [
                { "name": "name", "type": "string" },
                { "name": "category", "type": "string", "facet": true },
                { "name": "badges", "type": "string[]", "facet": true },
                { "name": "description", "type": "string", "index": false, "optional": true },
                { "name": "logo_url", "type": "string", "index": false, "optional": true },
                { "name": "like_count", "type": "int64" }
            ],
            "default_sorting_field": "like_count"
        })
    }
}

#[async_trait]
impl SearchClient for TypesenseClient {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<SearchHit>> {
        let req = self.build_search_request(query, limit)?;
        let resp = self
            .http
            .execute(req)
            .await
            .context("typesense search")?
            .error_for_status()
            .context("typesense search status")?;
        let body: SearchResponse = resp.json().await.context("typesense search body")?;
        debug!(query, hits = body.hits.len(), "search");
        Ok(body
            .hits
            .into_iter()
            .take(limit)
            .map(|h| SearchHit::from(h.document))
            .collect())
    }

    async fn upsert_tool(&self, doc: &SearchDocument) -> anyhow::Result<()> {
        let url = self.endpoint(&["collections", &self.collection, "documents"])?;
        self.http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("action", "upsert")])
            .json(doc)
            .send()
            .await
            .context("typesense upsert")?
            .error_for_status()
            .context("typesense upsert status")?;
        Ok(())
    }

    async fn delete_tool(&self, tool_id: Uuid) -> anyhow::Result<()> {
        let id = tool_id.to_string();
        let url = self.endpoint(&["collections", &self.collection, "documents", &id])?;
        let resp = self
            .http
            .delete(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .context("typesense delete")?;
        // Already gone is fine.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        resp.error_for_status().context("typesense delete status")?;
        Ok(())
    }

    async fn ensure_collection(&self) -> anyhow::Result<()> {
        let url = self.endpoint(&["collections", &self.collection])?;
        let resp = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .context("typesense get collection")?;
        if resp.status().is_success() {
            return Ok(());
        }
        if resp.status() != StatusCode::NOT_FOUND {
            resp.error_for_status().context("typesense get collection status")?;
            return Ok(());
        }

        let url = self.endpoint(&["collections"])?;
        self.http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.collection_schema())
            .send()
            .await
            .context("typesense create collection")?
            .error_for_status()
            .context("typesense create collection status")?;
        tracing::info!(collection = %self.collection, "search collection created");
        Ok(())
    }
}
