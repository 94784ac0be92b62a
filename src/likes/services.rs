use tracing::info;
use uuid::Uuid;

use super::repo::{self, LikeState};
use crate::{error::AppError, state::AppState, tools};

/// Flip the like and push the new count to the search index.
pub async fn toggle(st: &AppState, user_id: Uuid, tool_id: Uuid) -> Result<LikeState, AppError> {
    let like = repo::toggle_like(&st.db, user_id, tool_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tool not found".into()))?;
    info!(%user_id, %tool_id, liked = like.liked, like_count = like.like_count, "like toggled");

    tools::services::refresh_index(st, tool_id).await;
    Ok(like)
}
