//! Unified error types for the docuhub core crate.
//!
//! Storage backends raise [`StorageError`]; everything that crosses the
//! client/server boundary is reduced to a [`RegistryError`] tagged with an
//! [`ErrorKind`], so every caller handles the same taxonomy exhaustively.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client-visible error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// No resolvable owner identity.
    Unauthorized,
    /// The referenced object or record does not exist.
    NotFound,
    /// The target name is already occupied.
    Duplicate,
    /// The file name violates storage key constraints.
    InvalidKey,
    /// The document has no usable content.
    NoContent,
    /// The request itself was malformed (missing file, unsupported type, ...).
    InvalidInput,
    /// Anything else, including transport failures.
    NetworkOrUnknown,
}

impl ErrorKind {
    /// HTTP status used for this kind on the wire.
    ///
    /// Storage rejections (duplicate, invalid key, no content) all map to 400.
    pub fn status(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::Duplicate | Self::InvalidKey | Self::NoContent | Self::InvalidInput => 400,
            Self::NetworkOrUnknown => 500,
        }
    }

    /// Best-effort classification when a response carries no explicit kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            409 => Self::Duplicate,
            400 => Self::InvalidInput,
            _ => Self::NetworkOrUnknown,
        }
    }
}

/// A classified failure as seen by callers of the registry and the
/// server actions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RegistryError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RegistryError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, "Unauthorized: User is not logged in")
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkOrUnknown, message)
    }
}

/// Errors raised by object storage backends.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No object exists under the given key.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// An object already exists under the target key.
    #[error("The resource already exists: {0}")]
    AlreadyExists(String),

    /// The key contains characters the store does not accept.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A backend operation failed for another reason.
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// A low-level I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::Duplicate,
            Self::InvalidKey(_) => ErrorKind::InvalidKey,
            Self::OperationFailed(_) | Self::Io(_) => ErrorKind::NetworkOrUnknown,
        }
    }
}

impl From<StorageError> for RegistryError {
    fn from(err: StorageError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Errors raised by the project registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    #[error("Invalid project: {0}")]
    InvalidInput(String),

    #[error("Project already exists: {0}")]
    Duplicate(String),

    #[error("Project not found: {0}")]
    NotFound(String),
}

impl From<ProjectError> for RegistryError {
    fn from(err: ProjectError) -> Self {
        let kind = match &err {
            ProjectError::InvalidInput(_) => ErrorKind::InvalidInput,
            ProjectError::Duplicate(_) => ErrorKind::Duplicate,
            ProjectError::NotFound(_) => ErrorKind::NotFound,
        };
        Self::new(kind, err.to_string())
    }
}
