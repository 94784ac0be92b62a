use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use super::dto::{ReindexResponse, SearchQuery, SearchResults, NO_RESULTS};
use crate::{auth::AdminUser, error::AppError, state::AppState, tools};

/// Hits shown in the dropdown.
pub const SEARCH_LIMIT: usize = 10;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/search", get(search))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/search/reindex", post(reindex))
}

/// Blank input clears the results without asking the index.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResults>, AppError> {
    if params.q.trim().is_empty() {
        return Ok(Json(SearchResults {
            query: params.q,
            hits: Vec::new(),
            message: None,
        }));
    }

    let hits = state
        .search
        .search(params.q.trim(), SEARCH_LIMIT)
        .await
        .map_err(|e| {
            error!(error = %e, query = %params.q, "search failed");
            AppError::Upstream("Search is unavailable".into())
        })?;

    let message = hits.is_empty().then_some(NO_RESULTS);
    Ok(Json(SearchResults {
        query: params.q,
        hits,
        message,
    }))
}

#[instrument(skip(state), fields(admin_id = %admin.id))]
pub async fn reindex(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<ReindexResponse>, AppError> {
    let indexed = tools::services::reindex_all(&state).await?;
    info!(indexed, "reindex requested");
    Ok(Json(ReindexResponse { indexed }))
}
