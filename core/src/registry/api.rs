use std::sync::Arc;

use crate::errors::RegistryError;
use crate::files::FileEntry;
use crate::intake::{IncomingFile, Intake};
use crate::storage::{ListOptions, ObjectData, SignedUrl};

/// Upload progress callback, called with a percentage in `0..=100`.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// The registry's view of the file endpoints.
///
/// An implementation is bound to one signed-in session, so calls carry no
/// owner: the credential it was built with decides whose files are seen.
#[async_trait::async_trait]
pub trait FileApi: Send + Sync {
    async fn list(&self, options: ListOptions) -> Result<Vec<FileEntry>, RegistryError>;

    async fn signed_url(&self, name: &str) -> Result<SignedUrl, RegistryError>;

    async fn download(&self, name: &str) -> Result<ObjectData, RegistryError>;

    async fn delete(&self, name: &str) -> Result<FileEntry, RegistryError>;

    async fn rename(&self, name: &str, new_name: &str) -> Result<FileEntry, RegistryError>;

    async fn upload(
        &self,
        file: IncomingFile,
        intake: Intake,
        progress: ProgressFn,
    ) -> Result<FileEntry, RegistryError>;
}
