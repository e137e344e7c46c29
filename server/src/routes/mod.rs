//! HTTP routing.

pub mod actions;
pub mod files;
pub mod health;
pub mod projects;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest accepted request body (uploads included).
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/files", get(files::list))
        .route("/files/:name", get(files::signed_url))
        .route("/files/:name/download", get(files::download))
        .route("/signed/:token", get(files::redeem_signed))
        .route("/upload", post(upload::upload))
        .route("/analyze", post(upload::analyze))
        .route("/actions/delete-file", post(actions::delete_file))
        .route("/actions/rename-file", post(actions::rename_file))
        .route("/projects", get(projects::list).post(projects::create))
        .route("/projects/:name", delete(projects::delete))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
