//! Multipart upload intake for `/upload` and `/analyze`.

use axum::extract::{Multipart, State};
use axum::Json;
use docuhub_core::errors::RegistryError;
use docuhub_core::files::FileEntry;
use docuhub_core::intake::{self, IncomingFile, Intake};

use crate::auth::Owner;
use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the document.
const FILE_FIELD: &str = "file";

pub async fn upload(
    State(state): State<AppState>,
    Owner(owner): Owner,
    multipart: Multipart,
) -> Result<Json<FileEntry>, ApiError> {
    receive(state, owner, multipart, Intake::Store).await
}

pub async fn analyze(
    State(state): State<AppState>,
    Owner(owner): Owner,
    multipart: Multipart,
) -> Result<Json<FileEntry>, ApiError> {
    receive(state, owner, multipart, Intake::Analyze).await
}

async fn receive(
    state: AppState,
    owner: docuhub_core::identity::OwnerId,
    multipart: Multipart,
    intake: Intake,
) -> Result<Json<FileEntry>, ApiError> {
    let file = single_file(multipart).await?;
    let entry = intake::store_upload(state.store.as_ref(), &owner, intake, file).await?;
    Ok(Json(entry))
}

/// Read exactly one `file` field; other fields are ignored.
async fn single_file(mut multipart: Multipart) -> Result<IncomingFile, ApiError> {
    let mut found = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RegistryError::invalid_input(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if found.is_some() {
            return Err(RegistryError::invalid_input("Only one file can be uploaded per request").into());
        }
        let name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| RegistryError::invalid_input("The uploaded file has no name"))?;
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| RegistryError::invalid_input(format!("Malformed upload: {e}")))?;
        found = Some(IncomingFile {
            name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    found.ok_or_else(|| RegistryError::invalid_input("No file provided").into())
}
