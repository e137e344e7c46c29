use std::sync::Arc;
use std::time::Instant;

use docuhub_core::identity::IdentityProvider;
use docuhub_core::projects::ProjectRegistry;
use docuhub_core::storage::local::LocalObjectStore;
use docuhub_core::storage::memory::MemoryObjectStore;
use docuhub_core::storage::signing::UrlSigner;
use docuhub_core::storage::ObjectStore;
use tracing::info;

use crate::config::{ConfigError, ServerConfig, StorageConfig};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub signer: Arc<UrlSigner>,
    pub projects: Arc<ProjectRegistry>,
    pub signed_url_ttl: chrono::Duration,
    pub list_limit: usize,
    pub started_at: Instant,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let signed_url_ttl = config.signed_url_ttl()?;
        let signer = Arc::new(UrlSigner::new(config.signed_base_url()));
        let store: Arc<dyn ObjectStore> = match &config.storage {
            StorageConfig::Memory => {
                info!("Using in-memory storage");
                Arc::new(MemoryObjectStore::new(Arc::clone(&signer)))
            }
            StorageConfig::Local { root } => {
                info!("Using local storage at {}", root.display());
                let store = LocalObjectStore::open(root, Arc::clone(&signer))
                    .map_err(|e| ConfigError::Invalid(format!("storage root: {e}")))?;
                Arc::new(store)
            }
        };
        let identity = config.identity()?;
        info!("{} bearer token(s) configured", identity.len());

        Ok(Self {
            store,
            identity: Arc::new(identity),
            signer,
            projects: Arc::new(ProjectRegistry::new()),
            signed_url_ttl,
            list_limit: config.list_limit,
            started_at: Instant::now(),
        })
    }
}
