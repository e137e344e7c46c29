//! Client-side file registry.
//!
//! A [`FileRegistry`] keeps one signed-in owner's view of their stored files
//! consistent with the server across concurrent list, upload, rename and
//! delete calls:
//!
//! - listings are cached and concurrent listings share one request;
//! - every mutation marks the cache stale when it starts and again when it
//!   settles, then schedules a background re-fetch;
//! - deletes remove the entry locally before the server answers and are
//!   never rolled back; the re-fetch is the reconciliation;
//! - renames change nothing locally until the re-fetch;
//! - failures are reported through [`Notice`]s and returned as tagged
//!   [`RegistryError`]s.

pub mod api;
pub mod cache;
pub mod download;
#[cfg(feature = "http-client")]
pub mod http;
pub mod in_process;
pub mod inflight;
pub mod notice;
pub mod upload;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use futures_util::future::{join_all, FutureExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

pub use api::{FileApi, ProgressFn};
pub use cache::{CacheSnapshot, Freshness};
pub use download::{DirectorySink, DownloadedFile, SaveSink};
pub use in_process::StoreFileApi;
pub use notice::{Notice, NoticeLevel};
pub use upload::{UploadStatus, UploadTracker};

use cache::FileListCache;
use inflight::{Admission, InFlight, RequestKey};

use crate::errors::{ErrorKind, RegistryError};
use crate::files::mime::content_type_for;
use crate::files::sort::SortState;
use crate::files::FileEntry;
use crate::identity::OwnerId;
use crate::intake::{IncomingFile, Intake};
use crate::storage::{ListOptions, SignedUrl};

/// A cached read URL is not handed out this close to its expiry.
const READ_URL_SAFETY_MARGIN_SECS: i64 = 30;

/// Per-name state of read-URL resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadUrlState {
    Loading,
    Ready(SignedUrl),
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed(FileEntry),
    /// The new name was empty or unchanged; nothing was sent.
    Skipped,
}

/// Result for one file of an upload batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub name: String,
    pub result: Result<FileEntry, RegistryError>,
}

struct RegistryInner {
    api: Arc<dyn FileApi>,
    owner: OwnerId,
    list_options: ListOptions,
    cache: Mutex<FileListCache>,
    list_requests: Arc<InFlight<Vec<FileEntry>>>,
    url_requests: Arc<InFlight<SignedUrl>>,
    read_urls: Mutex<HashMap<String, ReadUrlState>>,
    uploads: UploadTracker,
    notices: UnboundedSender<Notice>,
    signed_out: AtomicBool,
}

impl RegistryInner {
    fn cache(&self) -> MutexGuard<'_, FileListCache> {
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn read_urls(&self) -> MutexGuard<'_, HashMap<String, ReadUrlState>> {
        self.read_urls.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn notify(&self, notice: Notice) {
        // A closed channel only means nobody is displaying notices.
        let _ = self.notices.send(notice);
    }
}

/// The file registry of one signed-in session. Cheap to clone.
#[derive(Clone)]
pub struct FileRegistry {
    inner: Arc<RegistryInner>,
}

impl FileRegistry {
    /// Create the registry for `owner`'s session. `api` must be bound to the
    /// same session's credential.
    pub fn new(api: Arc<dyn FileApi>, owner: OwnerId, notices: UnboundedSender<Notice>) -> Self {
        Self::with_list_options(api, owner, notices, ListOptions::default())
    }

    pub fn with_list_options(
        api: Arc<dyn FileApi>,
        owner: OwnerId,
        notices: UnboundedSender<Notice>,
        list_options: ListOptions,
    ) -> Self {
        info!("File registry opened for {}", owner);
        Self {
            inner: Arc::new(RegistryInner {
                api,
                owner,
                list_options,
                cache: Mutex::new(FileListCache::new()),
                list_requests: InFlight::new(),
                url_requests: InFlight::new(),
                read_urls: Mutex::new(HashMap::new()),
                uploads: UploadTracker::new(),
                notices,
                signed_out: AtomicBool::new(false),
            }),
        }
    }

    pub fn owner(&self) -> &OwnerId {
        &self.inner.owner
    }

    /// Current cache contents and freshness.
    pub fn snapshot(&self) -> CacheSnapshot {
        self.inner.cache().snapshot()
    }

    /// The cached entries ordered for display. Does not touch the cache.
    pub fn sorted_files(&self, sort: SortState) -> Vec<FileEntry> {
        sort.apply(&self.inner.cache().snapshot().entries)
    }

    pub fn uploads(&self) -> &UploadTracker {
        &self.inner.uploads
    }

    /// Tear the session down. Every later call fails with `Unauthorized`,
    /// and responses still in flight are discarded.
    pub fn sign_out(&self) {
        self.inner.signed_out.store(true, Ordering::SeqCst);
        self.inner.cache().reset();
        self.inner.list_requests.clear();
        self.inner.url_requests.clear();
        self.inner.read_urls().clear();
        self.inner.uploads.clear();
        info!("File registry closed for {}", self.inner.owner);
    }

    fn ensure_signed_in(&self) -> Result<(), RegistryError> {
        if self.inner.signed_out.load(Ordering::SeqCst) {
            return Err(RegistryError::unauthorized());
        }
        Ok(())
    }

    // ── Read path ──────────────────────────────────────────────────────

    /// The owner's files in storage order.
    ///
    /// Served from the cache when it is fresh; otherwise joins the listing
    /// already in flight or starts one.
    pub async fn list_files(&self) -> Result<Vec<FileEntry>, RegistryError> {
        self.ensure_signed_in()?;
        let key = RequestKey::list(&self.inner.owner);
        let fetcher = Arc::clone(&self.inner);
        let admission = self.inner.list_requests.admit(
            key,
            || self.inner.cache().servable(),
            move || {
                let generation = fetcher.cache().begin_fetch();
                debug!("Listing files for {} (generation {})", fetcher.owner, generation);
                async move {
                    let result = fetcher.api.list(fetcher.list_options).await;
                    let applied = fetcher.cache().complete_fetch(generation, &result);
                    if !applied {
                        debug!("Discarding listing from generation {}", generation);
                    }
                    if let Err(err) = &result {
                        warn!("Listing files failed: {}", err);
                    }
                    result
                }
                .boxed()
            },
        );

        match admission {
            Admission::Ready(entries) => Ok(entries),
            Admission::Joined(request) | Admission::Started(request) => request.await,
        }
    }

    /// Request a time-limited read URL for `name`.
    pub async fn resolve_read_url(&self, name: &str) -> Result<SignedUrl, RegistryError> {
        self.ensure_signed_in()?;
        if name.is_empty() {
            return Err(RegistryError::new(
                ErrorKind::InvalidKey,
                "File name must not be empty",
            ));
        }

        self.inner
            .read_urls()
            .insert(name.to_string(), ReadUrlState::Loading);

        let requester = Arc::clone(&self.inner);
        let subject = name.to_string();
        let admission = self.inner.url_requests.admit(
            RequestKey::read_url(&self.inner.owner, name),
            || None,
            move || async move { requester.api.signed_url(&subject).await }.boxed(),
        );
        let result = match admission {
            Admission::Ready(url) => Ok(url),
            Admission::Joined(request) | Admission::Started(request) => request.await,
        };

        if !self.inner.signed_out.load(Ordering::SeqCst) {
            let state = match &result {
                Ok(url) => ReadUrlState::Ready(url.clone()),
                Err(err) if err.kind == ErrorKind::NotFound => ReadUrlState::NotFound,
                Err(err) => ReadUrlState::Failed(err.message.clone()),
            };
            self.inner.read_urls().insert(name.to_string(), state);
        }
        result
    }

    pub fn read_url_state(&self, name: &str) -> Option<ReadUrlState> {
        self.inner.read_urls().get(name).cloned()
    }

    /// The last resolved URL for `name` if it is not about to expire.
    pub fn cached_read_url(&self, name: &str) -> Option<SignedUrl> {
        let margin = chrono::Duration::seconds(READ_URL_SAFETY_MARGIN_SECS);
        match self.inner.read_urls().get(name) {
            Some(ReadUrlState::Ready(url)) if Utc::now() + margin < url.expires_at => {
                Some(url.clone())
            }
            _ => None,
        }
    }

    // ── Mutation path ──────────────────────────────────────────────────

    fn invalidate(&self) {
        self.inner.cache().invalidate();
        self.inner
            .list_requests
            .detach(&RequestKey::list(&self.inner.owner));
    }

    /// Invalidate again once a mutation has settled and re-fetch in the
    /// background.
    fn settle_mutation(&self) {
        self.invalidate();
        let registry = self.clone();
        tokio::spawn(async move {
            if let Err(err) = registry.list_files().await {
                debug!("Background re-fetch failed: {}", err);
            }
        });
    }

    /// Delete `name`. The entry disappears from the local view immediately
    /// and is not restored if the server rejects the delete.
    pub async fn delete_file(&self, name: &str) -> Result<FileEntry, RegistryError> {
        self.ensure_signed_in()?;
        self.invalidate();
        self.inner.cache().remove(name);

        let result = self.inner.api.delete(name).await;
        match &result {
            Ok(_) => {
                info!("Deleted {}", name);
                self.inner.read_urls().remove(name);
                self.inner
                    .notify(Notice::success(format!("{name} deleted successfully")));
            }
            Err(err) => {
                warn!("Delete of {} failed: {}", name, err);
                self.inner.notify(Notice::from_error(err));
            }
        }

        self.settle_mutation();
        result
    }

    /// Rename `name` to `new_name` (trimmed). An empty or unchanged name is
    /// skipped without a request.
    pub async fn rename_file(
        &self,
        name: &str,
        new_name: &str,
    ) -> Result<RenameOutcome, RegistryError> {
        self.ensure_signed_in()?;
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name == name {
            return Ok(RenameOutcome::Skipped);
        }

        self.invalidate();
        let result = self.inner.api.rename(name, new_name).await;
        match &result {
            Ok(_) => {
                info!("Renamed {} to {}", name, new_name);
                self.inner.read_urls().remove(name);
                self.inner
                    .notify(Notice::success(format!("{name} renamed to {new_name}")));
            }
            Err(err) => {
                warn!("Rename of {} to {} failed: {}", name, new_name, err);
                self.inner.notify(Notice::from_error(err));
            }
        }

        self.settle_mutation();
        result.map(RenameOutcome::Renamed)
    }

    /// Download `name` and hand it to `sink`. Nothing is cached.
    pub async fn download_file(
        &self,
        name: &str,
        sink: &dyn SaveSink,
    ) -> Result<(), RegistryError> {
        self.ensure_signed_in()?;
        let outcome = async {
            let data = self.inner.api.download(name).await?;
            let file = DownloadedFile {
                file_name: name.to_string(),
                content_type: content_type_for(name).to_string(),
                bytes: data.bytes,
            };
            sink.save(file)
                .await
                .map_err(|e| RegistryError::unknown(e.to_string()))
        }
        .await;

        outcome.map_err(|err| {
            warn!("Download of {} failed: {}", name, err);
            self.inner.notify(Notice::error(
                "Download failed",
                format!("Could not download {name}"),
            ));
            RegistryError::new(err.kind, format!("Download failed: {}", err.message))
        })
    }

    /// Upload a batch concurrently. Each file gets its own status record in
    /// [`FileRegistry::uploads`]; the cache is re-fetched once the whole
    /// batch has settled.
    pub async fn upload_files(
        &self,
        files: Vec<IncomingFile>,
        intake: Intake,
    ) -> Result<Vec<UploadOutcome>, RegistryError> {
        self.ensure_signed_in()?;
        self.invalidate();

        let uploads = files.into_iter().map(|file| {
            let inner = Arc::clone(&self.inner);
            async move {
                let name = file.name.clone();
                inner.uploads.start(&name);
                let progress: ProgressFn = {
                    let inner = Arc::clone(&inner);
                    let name = name.clone();
                    Arc::new(move |percent| inner.uploads.progress(&name, percent))
                };

                let result = inner.api.upload(file, intake, progress).await;
                match &result {
                    Ok(_) => {
                        inner.uploads.succeed(&name);
                        inner.notify(Notice::success(format!("{name} uploaded successfully")));
                    }
                    Err(err) => {
                        warn!("Upload of {} failed: {}", name, err);
                        inner.uploads.fail(&name, err.message.clone());
                        inner.notify(Notice::from_error(err));
                    }
                }
                UploadOutcome { name, result }
            }
        });
        let outcomes = join_all(uploads).await;

        self.settle_mutation();
        Ok(outcomes)
    }
}
