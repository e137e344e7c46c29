use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docuhub_core::errors::{ProjectError, RegistryError, StorageError};
use docuhub_core::protocol::ErrorBody;
use thiserror::Error;
use tracing::warn;

/// Handler error rendered as `{error, errorKind}` with the kind's status.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ApiError(#[from] pub RegistryError);

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self(err.into())
    }
}

impl From<ProjectError> for ApiError {
    fn from(err: ProjectError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.kind.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (status, Json(ErrorBody::from(&self.0))).into_response()
    }
}
