//! The uniform result envelope returned by server actions and the plain
//! `{error}` body returned by the file routes.
//!
//! Rust call sites never inspect optional fields directly: they convert
//! with [`ApiEnvelope::from_result`] / [`ApiEnvelope::into_result`] and match
//! on the tagged `Result`.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorKind, RegistryError};

/// `{success, data?, error?, errorKind?, status}` as sent over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub status: u16,
}

impl<T> ApiEnvelope<T> {
    pub fn from_result(result: Result<T, RegistryError>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
                error_kind: None,
                status: 200,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(err.message),
                error_kind: Some(err.kind),
                status: err.kind.status(),
            },
        }
    }

    /// Convert back into the tagged form.
    ///
    /// A successful envelope without data is treated as a malformed
    /// response.
    pub fn into_result(self) -> Result<T, RegistryError> {
        if self.success {
            return self
                .data
                .ok_or_else(|| RegistryError::unknown("Response did not include any data"));
        }
        let kind = self
            .error_kind
            .unwrap_or_else(|| ErrorKind::from_status(self.status));
        let message = self
            .error
            .unwrap_or_else(|| "An unexpected error occurred".to_string());
        Err(RegistryError::new(kind, message))
    }
}

/// Error body of the plain HTTP routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ErrorBody {
    pub fn into_error(self, status: u16) -> RegistryError {
        let kind = self.error_kind.unwrap_or_else(|| ErrorKind::from_status(status));
        RegistryError::new(kind, self.error)
    }
}

impl From<&RegistryError> for ErrorBody {
    fn from(err: &RegistryError) -> Self {
        Self {
            error: err.message.clone(),
            error_kind: Some(err.kind),
        }
    }
}
