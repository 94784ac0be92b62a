use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    dto::CreateTermRequest,
    repo,
    repo_types::{TaxonomyKind, Term},
};
use crate::{auth::AdminUser, error::{AppError, FieldErrors}, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/ecosystems", get(list_ecosystems))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/categories", post(create_category))
        .route("/admin/ecosystems", post(create_ecosystem))
}

fn is_valid_slug(id: &str) -> bool {
    lazy_static! {
        static ref SLUG_RE: Regex = Regex::new(r"^[a-z0-9][a-z0-9_-]{0,63}$").unwrap();
    }
    SLUG_RE.is_match(id)
}

pub(crate) fn validate_term(req: &CreateTermRequest) -> Result<(String, String), FieldErrors> {
    let mut errors = FieldErrors::new();
    let id = req.id.trim().to_string();
    let name = req.name.trim().to_string();
    if !is_valid_slug(&id) {
        errors.insert(
            "id".into(),
            "Id must be lowercase letters, digits, '-' or '_'".into(),
        );
    }
    if name.is_empty() {
        errors.insert("name".into(), "Name is required".into());
    }
    if errors.is_empty() {
        Ok((id, name))
    } else {
        Err(errors)
    }
}

#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Term>>, AppError> {
    Ok(Json(repo::list(&state.db, TaxonomyKind::Category).await?))
}

#[instrument(skip(state))]
pub async fn list_ecosystems(State(state): State<AppState>) -> Result<Json<Vec<Term>>, AppError> {
    Ok(Json(repo::list(&state.db, TaxonomyKind::Ecosystem).await?))
}

async fn create_term(
    state: &AppState,
    kind: TaxonomyKind,
    req: CreateTermRequest,
) -> Result<(StatusCode, Json<Term>), AppError> {
    let (id, name) = validate_term(&req).map_err(AppError::Validation)?;
    let Some(term) = repo::insert(&state.db, kind, &id, &name).await? else {
        warn!(kind = kind.label(), %id, "duplicate id");
        return Err(AppError::Conflict(format!("{} '{}' already exists", kind.label(), id)));
    };
    info!(kind = kind.label(), id = %term.id, "term created");
    Ok((StatusCode::CREATED, Json(term)))
}

#[instrument(skip(state, req))]
pub async fn create_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateTermRequest>,
) -> Result<(StatusCode, Json<Term>), AppError> {
    create_term(&state, TaxonomyKind::Category, req).await
}

#[instrument(skip(state, req))]
pub async fn create_ecosystem(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateTermRequest>,
) -> Result<(StatusCode, Json<Term>), AppError> {
    create_term(&state, TaxonomyKind::Ecosystem, req).await
}
