//! User-visible notices emitted by registry mutations.

use serde::Serialize;

use crate::errors::{ErrorKind, RegistryError};
use crate::files::ALLOWED_CHARACTERS_HINT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A toast-style message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl Notice {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: "Success".to_string(),
            description: description.into(),
            hint: None,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
            hint: None,
        }
    }

    /// Describe a failed operation, keeping the server's reason when it
    /// sent one. Name-related rejections carry the allowed-characters hint.
    pub fn from_error(err: &RegistryError) -> Self {
        let summary = match err.kind {
            ErrorKind::Duplicate => Some("A file with this name already exists"),
            ErrorKind::NotFound => Some("File not found"),
            ErrorKind::Unauthorized => Some("You are not signed in"),
            _ => None,
        };
        let reason = err.message.trim();
        let description = match (summary, reason) {
            (Some(summary), "") => summary.to_string(),
            (Some(summary), reason) if reason == summary => summary.to_string(),
            (Some(summary), reason) => format!("{summary}: {reason}"),
            (None, "") => "An unexpected error occurred".to_string(),
            (None, reason) => reason.to_string(),
        };
        let hint = matches!(err.kind, ErrorKind::Duplicate | ErrorKind::InvalidKey)
            .then_some(ALLOWED_CHARACTERS_HINT);
        Self {
            level: NoticeLevel::Error,
            title: "Error".to_string(),
            description,
            hint,
        }
    }
}
