pub mod key;
pub mod mime;
pub mod size;
pub mod sort;

use serde::{Deserialize, Serialize};

pub use key::{validate_object_name, ObjectKey, ALLOWED_CHARACTERS_HINT};

/// One stored object visible to its owner.
///
/// `name` is the stable client-side key for every operation; `id` is
/// assigned by storage and only used for display.
/// Field names are serialized as camelCase for the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    /// RFC 3339 timestamp.
    pub last_accessed_at: String,
}
