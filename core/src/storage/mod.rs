//! Object storage gateway.
//!
//! Each backend stores blobs under `{ownerId}/{fileName}` keys and
//! implements the [`ObjectStore`] trait. Handlers only ever talk to
//! `dyn ObjectStore`, so the in-memory and local-filesystem backends are
//! interchangeable.

pub mod local;
pub mod memory;
pub mod signing;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::files::{FileEntry, ObjectKey};
use crate::identity::OwnerId;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Signed read URLs stay valid for one hour.
pub const SIGNED_URL_TTL_SECS: i64 = 3600;

/// What `put` does when the key is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    RejectExisting,
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

/// Raw object contents returned by [`ObjectStore::download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectData {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// A time-limited URL that reads one object without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrl {
    pub signed_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Async blob store scoped by owner prefix.
///
/// Uses `#[async_trait]` for dyn compatibility in the server state.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`.
    async fn put(
        &self,
        key: &ObjectKey,
        data: &[u8],
        content_type: &str,
        mode: WriteMode,
    ) -> Result<FileEntry, StorageError>;

    /// Issue a read URL valid for `ttl`.
    async fn signed_url(
        &self,
        key: &ObjectKey,
        ttl: chrono::Duration,
    ) -> Result<SignedUrl, StorageError>;

    /// Remove an object, returning its last metadata.
    async fn delete(&self, key: &ObjectKey) -> Result<FileEntry, StorageError>;

    /// Atomically move an object to a new key. The object keeps its id.
    async fn rename(&self, from: &ObjectKey, to: &ObjectKey) -> Result<FileEntry, StorageError>;

    /// List one owner's objects in storage order (by name).
    async fn list(
        &self,
        owner: &OwnerId,
        options: ListOptions,
    ) -> Result<Vec<FileEntry>, StorageError>;

    /// Read an object's bytes and stored content type.
    async fn download(&self, key: &ObjectKey) -> Result<ObjectData, StorageError>;
}
