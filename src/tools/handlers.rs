use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CatalogFilter, CatalogView, DeleteToolResponse, ToolDetails, ToolForm},
    repo_types::Tool,
    services,
};
use crate::{
    auth::{AdminUser, MaybeAuthUser},
    error::AppError,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/:id", get(get_tool))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/tools", post(create_tool))
        .route("/admin/tools/:id", put(update_tool).delete(delete_tool))
}

#[instrument(skip(state))]
pub async fn list_tools(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> Result<Json<CatalogView>, AppError> {
    Ok(Json(services::catalog(&state, &filter).await?))
}

#[instrument(skip(state, viewer))]
pub async fn get_tool(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ToolDetails>, AppError> {
    let viewer = viewer.map(|u| u.id);
    Ok(Json(services::tool_details(&state, id, viewer).await?))
}

#[instrument(skip(state, form), fields(admin_id = %admin.id))]
pub async fn create_tool(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(form): Json<ToolForm>,
) -> Result<(StatusCode, Json<Tool>), AppError> {
    let tool = services::create_tool(&state, form).await?;
    Ok((StatusCode::CREATED, Json(tool)))
}

#[instrument(skip(state, form), fields(admin_id = %admin.id))]
pub async fn update_tool(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(form): Json<ToolForm>,
) -> Result<Json<Tool>, AppError> {
    Ok(Json(services::update_tool(&state, id, form).await?))
}

#[instrument(skip(state), fields(admin_id = %admin.id))]
pub async fn delete_tool(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteToolResponse>, AppError> {
    let deleted = services::delete_tool(&state, id).await?;
    Ok(Json(DeleteToolResponse {
        id,
        likes_deleted: deleted.likes,
        comments_deleted: deleted.comments,
    }))
}
