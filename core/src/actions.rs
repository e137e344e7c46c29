//! Same-process server actions.
//!
//! These are called directly by the server (and by the in-process
//! `FileApi`), so they resolve ownership themselves and always answer with
//! an [`ApiEnvelope`] instead of propagating errors.

use tracing::{debug, warn};

use crate::errors::RegistryError;
use crate::files::{FileEntry, ObjectKey};
use crate::identity::OwnerId;
use crate::protocol::ApiEnvelope;
use crate::storage::ObjectStore;

/// Delete `name` from the caller's namespace.
pub async fn delete_file(
    store: &dyn ObjectStore,
    owner: Option<&OwnerId>,
    name: &str,
) -> ApiEnvelope<FileEntry> {
    let result = try_delete(store, owner, name).await;
    if let Err(err) = &result {
        warn!("delete-file {:?} failed: {}", name, err);
    }
    ApiEnvelope::from_result(result)
}

/// Move `name` to `new_name` within the caller's namespace.
pub async fn rename_file(
    store: &dyn ObjectStore,
    owner: Option<&OwnerId>,
    name: &str,
    new_name: &str,
) -> ApiEnvelope<FileEntry> {
    let result = try_rename(store, owner, name, new_name).await;
    if let Err(err) = &result {
        warn!("rename-file {:?} -> {:?} failed: {}", name, new_name, err);
    }
    ApiEnvelope::from_result(result)
}

async fn try_delete(
    store: &dyn ObjectStore,
    owner: Option<&OwnerId>,
    name: &str,
) -> Result<FileEntry, RegistryError> {
    let owner = owner.ok_or_else(RegistryError::unauthorized)?;
    let key = ObjectKey::new(owner, name)?;
    debug!("delete-file {}", key);
    Ok(store.delete(&key).await?)
}

async fn try_rename(
    store: &dyn ObjectStore,
    owner: Option<&OwnerId>,
    name: &str,
    new_name: &str,
) -> Result<FileEntry, RegistryError> {
    let owner = owner.ok_or_else(RegistryError::unauthorized)?;
    let from = ObjectKey::new(owner, name)?;
    let to = ObjectKey::new(owner, new_name.trim())?;
    debug!("rename-file {} -> {}", from, to);
    Ok(store.rename(&from, &to).await?)
}
