use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{dto::NewCommentRequest, repo, repo_types::Comment};
use crate::{auth::AuthUser, error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tools/:id/comments", get(list_comments).post(create_comment))
        .route("/comments/:id", delete(delete_comment))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(tool_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, AppError> {
    Ok(Json(repo::list_for_tool(&state.db, tool_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(tool_id): Path<Uuid>,
    Json(payload): Json<NewCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let body = payload
        .validated_body()
        .map_err(|msg| AppError::field("body", msg))?;
    let comment = repo::insert(&state.db, tool_id, user.id, body)
        .await?
        .ok_or_else(|| AppError::NotFound("Tool not found".into()))?;
    info!(comment_id = %comment.id, %tool_id, user_id = %user.id, "comment added");
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Authors delete their own comments; admins delete any.
#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let author = repo::author_of(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;
    if author != user.id && !user.admin {
        warn!(comment_id = %id, user_id = %user.id, "delete of foreign comment refused");
        return Err(AppError::Forbidden("Only the author can delete this comment".into()));
    }
    repo::delete(&state.db, id).await?;
    info!(comment_id = %id, user_id = %user.id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{app::build_app, state::AppState};

    #[tokio::test]
    async fn empty_comment_rejected_before_db() {
        let state = AppState::fake();
        let token = state.jwt.sign_access(Uuid::new_v4(), false).unwrap();
        let resp = build_app(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/tools/{}/comments", Uuid::new_v4()))
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"body":"   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    async fn delete_as(state: &AppState, comment_id: Uuid, user_id: Uuid, admin: bool) -> StatusCode {
        let auth = crate::testing::bearer(state, user_id, admin);
        build_app(state.clone())
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/v1/comments/{}", comment_id))
                    .header(header::AUTHORIZATION, auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn only_author_or_admin_deletes() {
        use crate::comments::repo;
        use crate::testing::{db_state, seed_tool, seed_user, DbFixture};

        let Some(DbFixture { state, .. }) = db_state().await else {
            return;
        };
        let tool = seed_tool(&state).await;
        let author = seed_user(&state, false).await;
        let stranger = seed_user(&state, false).await;
        let admin = seed_user(&state, true).await;

        let first = repo::insert(&state.db, tool.id, author.id, "first").await.unwrap().unwrap();
        let second = repo::insert(&state.db, tool.id, author.id, "second").await.unwrap().unwrap();

        assert_eq!(delete_as(&state, first.id, stranger.id, false).await, StatusCode::FORBIDDEN);
        assert_eq!(repo::author_of(&state.db, first.id).await.unwrap(), Some(author.id));

        assert_eq!(delete_as(&state, first.id, author.id, false).await, StatusCode::NO_CONTENT);
        assert_eq!(repo::author_of(&state.db, first.id).await.unwrap(), None);

        assert_eq!(delete_as(&state, second.id, admin.id, true).await, StatusCode::NO_CONTENT);
        assert_eq!(repo::author_of(&state.db, second.id).await.unwrap(), None);

        assert_eq!(delete_as(&state, second.id, admin.id, true).await, StatusCode::NOT_FOUND);
    }
}
