//! In-memory object store.
//!
//! Objects are kept in a `BTreeMap` keyed by `{owner}/{name}`, so a prefix
//! range yields one owner's objects already in name order.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::signing::UrlSigner;
use super::{ListOptions, ObjectData, ObjectStore, SignedUrl, WriteMode};
use crate::errors::StorageError;
use crate::files::{FileEntry, ObjectKey};
use crate::identity::OwnerId;

#[derive(Debug, Clone)]
struct StoredObject {
    id: String,
    name: String,
    bytes: Vec<u8>,
    content_type: String,
    last_accessed_at: DateTime<Utc>,
}

impl StoredObject {
    fn entry(&self) -> FileEntry {
        FileEntry {
            id: self.id.clone(),
            name: self.name.clone(),
            size_bytes: self.bytes.len() as u64,
            last_accessed_at: self.last_accessed_at.to_rfc3339(),
        }
    }
}

pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    signer: Arc<UrlSigner>,
}

impl MemoryObjectStore {
    pub fn new(signer: Arc<UrlSigner>) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            signer,
        }
    }

    /// Number of objects across all owners.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &ObjectKey,
        data: &[u8],
        content_type: &str,
        mode: WriteMode,
    ) -> Result<FileEntry, StorageError> {
        let mut objects = self.objects.write().await;
        let path = key.path();

        let id = match (objects.get(&path), mode) {
            (Some(_), WriteMode::RejectExisting) => {
                return Err(StorageError::AlreadyExists(path));
            }
            (Some(existing), WriteMode::Overwrite) => existing.id.clone(),
            (None, _) => uuid::Uuid::new_v4().to_string(),
        };

        let object = StoredObject {
            id,
            name: key.name().to_string(),
            bytes: data.to_vec(),
            content_type: content_type.to_string(),
            last_accessed_at: Utc::now(),
        };
        let entry = object.entry();
        objects.insert(path, object);
        Ok(entry)
    }

    async fn signed_url(
        &self,
        key: &ObjectKey,
        ttl: chrono::Duration,
    ) -> Result<SignedUrl, StorageError> {
        let objects = self.objects.read().await;
        if !objects.contains_key(&key.path()) {
            return Err(StorageError::NotFound(key.path()));
        }
        Ok(self.signer.issue(key, ttl))
    }

    async fn delete(&self, key: &ObjectKey) -> Result<FileEntry, StorageError> {
        let mut objects = self.objects.write().await;
        objects
            .remove(&key.path())
            .map(|object| object.entry())
            .ok_or_else(|| StorageError::NotFound(key.path()))
    }

    async fn rename(&self, from: &ObjectKey, to: &ObjectKey) -> Result<FileEntry, StorageError> {
        let mut objects = self.objects.write().await;
        if objects.contains_key(&to.path()) {
            return Err(StorageError::AlreadyExists(to.path()));
        }
        let mut object = objects
            .remove(&from.path())
            .ok_or_else(|| StorageError::NotFound(from.path()))?;
        object.name = to.name().to_string();
        let entry = object.entry();
        objects.insert(to.path(), object);
        Ok(entry)
    }

    async fn list(
        &self,
        owner: &OwnerId,
        options: ListOptions,
    ) -> Result<Vec<FileEntry>, StorageError> {
        let prefix = format!("{owner}/");
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .skip(options.offset)
            .take(options.limit)
            .map(|(_, object)| object.entry())
            .collect())
    }

    async fn download(&self, key: &ObjectKey) -> Result<ObjectData, StorageError> {
        let mut objects = self.objects.write().await;
        let object = objects
            .get_mut(&key.path())
            .ok_or_else(|| StorageError::NotFound(key.path()))?;
        object.last_accessed_at = Utc::now();
        Ok(ObjectData {
            bytes: object.bytes.clone(),
            content_type: object.content_type.clone(),
        })
    }
}
