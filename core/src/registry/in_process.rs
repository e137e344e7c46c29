//! [`FileApi`] backed directly by an [`ObjectStore`], for embedding the
//! registry in the same process as the storage (tools, tests, single-user
//! setups).

use std::sync::Arc;

use super::api::{FileApi, ProgressFn};
use crate::actions;
use crate::errors::RegistryError;
use crate::files::{FileEntry, ObjectKey};
use crate::identity::OwnerId;
use crate::intake::{self, IncomingFile, Intake};
use crate::storage::{ListOptions, ObjectData, ObjectStore, SignedUrl, SIGNED_URL_TTL_SECS};

pub struct StoreFileApi {
    store: Arc<dyn ObjectStore>,
    owner: Option<OwnerId>,
    ttl: chrono::Duration,
}

impl StoreFileApi {
    /// `owner` is `None` for an unauthenticated session; every call then
    /// fails with `Unauthorized`.
    pub fn new(store: Arc<dyn ObjectStore>, owner: Option<OwnerId>) -> Self {
        Self {
            store,
            owner,
            ttl: chrono::Duration::seconds(SIGNED_URL_TTL_SECS),
        }
    }

    fn owner(&self) -> Result<&OwnerId, RegistryError> {
        self.owner.as_ref().ok_or_else(RegistryError::unauthorized)
    }

    fn key(&self, name: &str) -> Result<ObjectKey, RegistryError> {
        Ok(ObjectKey::new(self.owner()?, name)?)
    }
}

#[async_trait::async_trait]
impl FileApi for StoreFileApi {
    async fn list(&self, options: ListOptions) -> Result<Vec<FileEntry>, RegistryError> {
        Ok(self.store.list(self.owner()?, options).await?)
    }

    async fn signed_url(&self, name: &str) -> Result<SignedUrl, RegistryError> {
        let key = self.key(name)?;
        Ok(self.store.signed_url(&key, self.ttl).await?)
    }

    async fn download(&self, name: &str) -> Result<ObjectData, RegistryError> {
        let key = self.key(name)?;
        Ok(self.store.download(&key).await?)
    }

    async fn delete(&self, name: &str) -> Result<FileEntry, RegistryError> {
        actions::delete_file(self.store.as_ref(), self.owner.as_ref(), name)
            .await
            .into_result()
    }

    async fn rename(&self, name: &str, new_name: &str) -> Result<FileEntry, RegistryError> {
        actions::rename_file(self.store.as_ref(), self.owner.as_ref(), name, new_name)
            .await
            .into_result()
    }

    async fn upload(
        &self,
        file: IncomingFile,
        intake: Intake,
        progress: ProgressFn,
    ) -> Result<FileEntry, RegistryError> {
        progress(0);
        let entry = intake::store_upload(self.store.as_ref(), self.owner()?, intake, file).await?;
        progress(100);
        Ok(entry)
    }
}
