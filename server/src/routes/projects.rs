use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use docuhub_core::projects::{NewProject, Project};

use crate::auth::Owner;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>, Owner(owner): Owner) -> Json<Vec<Project>> {
    Json(state.projects.list(&owner).await)
}

pub async fn create(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(input): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.projects.create(&owner, input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn delete(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.projects.delete(&owner, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}
