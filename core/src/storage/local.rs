//! Local-filesystem object store.
//!
//! Objects live at `{root}/{owner}/{name}`. Metadata that the filesystem
//! cannot hold (storage id, content type, last access) is kept in a JSON
//! sidecar at `{root}/.meta/{owner}/{name}.json`. Owner ids never start
//! with `.`, so the metadata tree cannot collide with an owner directory.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::signing::UrlSigner;
use super::{ListOptions, ObjectData, ObjectStore, SignedUrl, WriteMode};
use crate::errors::StorageError;
use crate::files::mime::FALLBACK_MIME;
use crate::files::{FileEntry, ObjectKey};
use crate::identity::OwnerId;

const META_DIR: &str = ".meta";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sidecar {
    id: String,
    content_type: String,
    last_accessed_at: DateTime<Utc>,
}

pub struct LocalObjectStore {
    root: PathBuf,
    signer: Arc<UrlSigner>,
    /// Serializes mutations so existence checks and renames do not race.
    write_lock: Mutex<()>,
}

impl LocalObjectStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, signer: Arc<UrlSigner>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(root.join(META_DIR))?;
        debug!("Local object store at {}", root.display());
        Ok(Self {
            root,
            signer,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run blocking filesystem work off the async runtime.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(Layout) -> Result<T, StorageError> + Send + 'static,
    {
        let layout = Layout {
            root: self.root.clone(),
        };
        tokio::task::spawn_blocking(move || f(layout))
            .await
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?
    }
}

/// Path arithmetic shared by the blocking helpers.
#[derive(Clone)]
struct Layout {
    root: PathBuf,
}

impl Layout {
    fn owner_dir(&self, owner: &OwnerId) -> PathBuf {
        self.root.join(owner.as_str())
    }

    fn object_path(&self, key: &ObjectKey) -> PathBuf {
        self.owner_dir(key.owner()).join(key.name())
    }

    fn sidecar_path(&self, key: &ObjectKey) -> PathBuf {
        self.root
            .join(META_DIR)
            .join(key.owner().as_str())
            .join(format!("{}.json", key.name()))
    }

    fn read_sidecar(&self, key: &ObjectKey) -> Option<Sidecar> {
        let raw = std::fs::read(self.sidecar_path(key)).ok()?;
        serde_json::from_slice(&raw).ok()
    }

    fn write_sidecar(&self, key: &ObjectKey, sidecar: &Sidecar) -> Result<(), StorageError> {
        let path = self.sidecar_path(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| map_io_error(e, key))?;
        }
        let raw = serde_json::to_vec(sidecar)
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?;
        std::fs::write(&path, raw).map_err(|e| map_io_error(e, key))
    }

    /// Metadata for an existing object; a missing sidecar is rebuilt from
    /// the file's modification time.
    fn entry(&self, key: &ObjectKey) -> Result<(FileEntry, Sidecar), StorageError> {
        let metadata =
            std::fs::metadata(self.object_path(key)).map_err(|e| map_io_error(e, key))?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(key.path()));
        }
        let sidecar = match self.read_sidecar(key) {
            Some(sidecar) => sidecar,
            None => {
                let modified = metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                let sidecar = Sidecar {
                    id: uuid::Uuid::new_v4().to_string(),
                    content_type: FALLBACK_MIME.to_string(),
                    last_accessed_at: modified,
                };
                self.write_sidecar(key, &sidecar)?;
                sidecar
            }
        };
        let entry = FileEntry {
            id: sidecar.id.clone(),
            name: key.name().to_string(),
            size_bytes: metadata.len(),
            last_accessed_at: sidecar.last_accessed_at.to_rfc3339(),
        };
        Ok((entry, sidecar))
    }
}

/// Map `std::io::Error` to `StorageError` based on error kind.
fn map_io_error(e: std::io::Error, key: &ObjectKey) -> StorageError {
    match e.kind() {
        std::io::ErrorKind::NotFound => StorageError::NotFound(key.path()),
        std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(key.path()),
        _ => StorageError::OperationFailed(format!("{}: {}", key, e)),
    }
}

#[async_trait::async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        key: &ObjectKey,
        data: &[u8],
        content_type: &str,
        mode: WriteMode,
    ) -> Result<FileEntry, StorageError> {
        let _guard = self.write_lock.lock().await;
        let key = key.clone();
        let data = data.to_vec();
        let content_type = content_type.to_string();
        self.blocking(move |layout| {
            std::fs::create_dir_all(layout.owner_dir(key.owner()))
                .map_err(|e| map_io_error(e, &key))?;

            let path = layout.object_path(&key);
            let previous = layout.read_sidecar(&key);
            let mut file = match mode {
                WriteMode::RejectExisting => OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&path),
                WriteMode::Overwrite => OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&path),
            }
            .map_err(|e| map_io_error(e, &key))?;

            let id = match (mode, previous) {
                (WriteMode::Overwrite, Some(prev)) => prev.id,
                _ => uuid::Uuid::new_v4().to_string(),
            };
            let sidecar = Sidecar {
                id,
                content_type,
                last_accessed_at: Utc::now(),
            };
            let written = file
                .write_all(&data)
                .map_err(|e| map_io_error(e, &key))
                .and_then(|()| layout.write_sidecar(&key, &sidecar));
            if let Err(err) = written {
                // A half-written new object would block retries as a duplicate.
                if mode == WriteMode::RejectExisting {
                    drop(file);
                    if let Err(e) = std::fs::remove_file(&path) {
                        warn!("Could not remove partial object {}: {}", path.display(), e);
                    }
                }
                return Err(err);
            }
            Ok(FileEntry {
                id: sidecar.id,
                name: key.name().to_string(),
                size_bytes: data.len() as u64,
                last_accessed_at: sidecar.last_accessed_at.to_rfc3339(),
            })
        })
        .await
    }

    async fn signed_url(
        &self,
        key: &ObjectKey,
        ttl: chrono::Duration,
    ) -> Result<SignedUrl, StorageError> {
        let probe = key.clone();
        self.blocking(move |layout| layout.entry(&probe).map(|_| ()))
            .await?;
        Ok(self.signer.issue(key, ttl))
    }

    async fn delete(&self, key: &ObjectKey) -> Result<FileEntry, StorageError> {
        let _guard = self.write_lock.lock().await;
        let key = key.clone();
        self.blocking(move |layout| {
            let (entry, _) = layout.entry(&key)?;
            std::fs::remove_file(layout.object_path(&key)).map_err(|e| map_io_error(e, &key))?;
            let _ = std::fs::remove_file(layout.sidecar_path(&key));
            Ok(entry)
        })
        .await
    }

    async fn rename(&self, from: &ObjectKey, to: &ObjectKey) -> Result<FileEntry, StorageError> {
        let _guard = self.write_lock.lock().await;
        let from = from.clone();
        let to = to.clone();
        self.blocking(move |layout| {
            let (_, sidecar) = layout.entry(&from)?;
            let target = layout.object_path(&to);
            if target.exists() {
                return Err(StorageError::AlreadyExists(to.path()));
            }
            std::fs::rename(layout.object_path(&from), &target)
                .map_err(|e| map_io_error(e, &from))?;
            layout.write_sidecar(&to, &sidecar)?;
            let _ = std::fs::remove_file(layout.sidecar_path(&from));
            layout.entry(&to).map(|(entry, _)| entry)
        })
        .await
    }

    async fn list(
        &self,
        owner: &OwnerId,
        options: ListOptions,
    ) -> Result<Vec<FileEntry>, StorageError> {
        let owner = owner.clone();
        self.blocking(move |layout| {
            let dir = layout.owner_dir(&owner);
            let read_dir = match std::fs::read_dir(&dir) {
                Ok(read_dir) => read_dir,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(StorageError::Io(e)),
            };

            let mut names = Vec::new();
            for dir_entry in read_dir {
                let dir_entry = dir_entry?;
                if !dir_entry.file_type()?.is_file() {
                    continue;
                }
                // Foreign files with unsupported names are not addressable.
                if let Some(name) = dir_entry.file_name().to_str() {
                    if let Ok(key) = ObjectKey::new(&owner, name) {
                        names.push(key);
                    }
                }
            }
            names.sort_by(|a, b| a.name().cmp(b.name()));

            names
                .iter()
                .skip(options.offset)
                .take(options.limit)
                .map(|key| layout.entry(key).map(|(entry, _)| entry))
                .collect()
        })
        .await
    }

    async fn download(&self, key: &ObjectKey) -> Result<ObjectData, StorageError> {
        let key = key.clone();
        self.blocking(move |layout| {
            let (_, mut sidecar) = layout.entry(&key)?;
            let bytes =
                std::fs::read(layout.object_path(&key)).map_err(|e| map_io_error(e, &key))?;
            sidecar.last_accessed_at = Utc::now();
            layout.write_sidecar(&key, &sidecar)?;
            Ok(ObjectData {
                bytes,
                content_type: sidecar.content_type,
            })
        })
        .await
    }
}
