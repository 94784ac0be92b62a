pub mod client;
pub mod cursor;
pub mod dto;
pub mod handlers;

use crate::state::AppState;
use axum::Router;

pub use client::{SearchClient, SearchDocument, SearchHit, TypesenseClient};
pub use cursor::ResultCursor;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::admin_routes())
}
