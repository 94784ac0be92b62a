use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    repo::{self, LikeState},
    services,
};
use crate::{auth::AuthUser, error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/tools/:id/like", get(get_like).post(toggle_like))
}

#[instrument(skip(state))]
pub async fn get_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(tool_id): Path<Uuid>,
) -> Result<Json<LikeState>, AppError> {
    repo::like_state(&state.db, user.id, tool_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Tool not found".into()))
}

#[instrument(skip(state))]
pub async fn toggle_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(tool_id): Path<Uuid>,
) -> Result<Json<LikeState>, AppError> {
    Ok(Json(services::toggle(&state, user.id, tool_id).await?))
}
