//! Server actions. Always answered with an envelope whose HTTP status
//! matches its `status` field.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use docuhub_core::actions;
use docuhub_core::files::FileEntry;
use docuhub_core::protocol::ApiEnvelope;
use serde::Deserialize;

use crate::auth::MaybeOwner;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameFileRequest {
    pub name: String,
    pub new_name: String,
}

type EnvelopeResponse = (StatusCode, Json<ApiEnvelope<FileEntry>>);

fn respond(envelope: ApiEnvelope<FileEntry>) -> EnvelopeResponse {
    let status = StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope))
}

pub async fn delete_file(
    State(state): State<AppState>,
    MaybeOwner(owner): MaybeOwner,
    Json(request): Json<DeleteFileRequest>,
) -> EnvelopeResponse {
    respond(actions::delete_file(state.store.as_ref(), owner.as_ref(), &request.name).await)
}

pub async fn rename_file(
    State(state): State<AppState>,
    MaybeOwner(owner): MaybeOwner,
    Json(request): Json<RenameFileRequest>,
) -> EnvelopeResponse {
    respond(
        actions::rename_file(
            state.store.as_ref(),
            owner.as_ref(),
            &request.name,
            &request.new_name,
        )
        .await,
    )
}
