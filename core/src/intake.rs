//! Server-side upload intake.
//!
//! Two intake paths share one storage step: plain `/upload` accepts PDF and
//! images, while `/analyze` accepts PDF only and checks that the document
//! has content before anything is written.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{ErrorKind, RegistryError};
use crate::files::mime::{effective_content_type, ACCEPTED_UPLOAD_TYPES, PDF_MIME};
use crate::files::{FileEntry, ObjectKey};
use crate::identity::OwnerId;
use crate::storage::{ObjectStore, WriteMode};

/// Magic bytes every PDF document starts with.
const PDF_HEADER: &[u8] = b"%PDF-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Intake {
    /// Store as-is.
    Store,
    /// Validate document content, then store.
    Analyze,
}

impl Intake {
    /// Route path on the server.
    pub fn path(self) -> &'static str {
        match self {
            Self::Store => "/upload",
            Self::Analyze => "/analyze",
        }
    }
}

/// One file received from a multipart request.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Check an incoming file against the intake rules and return the content
/// type it will be stored with. Never touches storage.
pub fn validate(intake: Intake, file: &IncomingFile) -> Result<String, RegistryError> {
    let content_type = effective_content_type(file.content_type.as_deref(), &file.name);
    match intake {
        Intake::Store => {
            if !ACCEPTED_UPLOAD_TYPES.contains(&content_type.as_str()) {
                return Err(RegistryError::invalid_input(format!(
                    "Unsupported file type: {content_type}. Upload a PDF, PNG or JPEG file"
                )));
            }
        }
        Intake::Analyze => {
            if content_type != PDF_MIME {
                return Err(RegistryError::invalid_input("Only PDF files can be analyzed"));
            }
            if !file.bytes.starts_with(PDF_HEADER) {
                return Err(RegistryError::new(
                    ErrorKind::NoContent,
                    "No content found in the document",
                ));
            }
        }
    }
    Ok(content_type)
}

/// Validate, then store under `{owner}/{name}`. Existing names are rejected.
pub async fn store_upload(
    store: &dyn ObjectStore,
    owner: &OwnerId,
    intake: Intake,
    file: IncomingFile,
) -> Result<FileEntry, RegistryError> {
    let key = ObjectKey::new(owner, &file.name)?;
    let content_type = validate(intake, &file)?;
    debug!("{} intake for {} ({} bytes)", intake.path(), key, file.bytes.len());

    let entry = store
        .put(&key, &file.bytes, &content_type, WriteMode::RejectExisting)
        .await?;
    info!("Stored {} as {}", key, content_type);
    Ok(entry)
}
