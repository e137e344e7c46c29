//! Shared test utilities for docuhub core integration tests.
//!
//! Provides a scripted [`FileApi`] whose server state, call counts, response
//! gates and failures are controlled by the test.

// Each integration test is compiled as its own crate, so not every test file
// uses every function from this shared module. Suppress dead_code warnings.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use docuhub_core::errors::{ErrorKind, RegistryError};
use docuhub_core::files::FileEntry;
use docuhub_core::identity::OwnerId;
use docuhub_core::intake::{IncomingFile, Intake};
use docuhub_core::registry::{FileApi, FileRegistry, Notice, ProgressFn};
use docuhub_core::storage::{ListOptions, ObjectData, SignedUrl};
use tokio::sync::{mpsc, Semaphore};

/// Holds responses back until the test releases them.
pub struct Gate(Semaphore);

impl Gate {
    fn closed() -> Self {
        Self(Semaphore::new(0))
    }

    pub fn release(&self, responses: usize) {
        self.0.add_permits(responses);
    }

    async fn pass(&self) {
        if let Ok(permit) = self.0.acquire().await {
            permit.forget();
        }
    }
}

#[derive(Default)]
pub struct Calls {
    pub list: AtomicUsize,
    pub signed_url: AtomicUsize,
    pub download: AtomicUsize,
    pub delete: AtomicUsize,
    pub rename: AtomicUsize,
    pub upload: AtomicUsize,
}

impl Calls {
    pub fn list(&self) -> usize {
        self.list.load(Ordering::SeqCst)
    }

    pub fn delete(&self) -> usize {
        self.delete.load(Ordering::SeqCst)
    }

    pub fn signed_url(&self) -> usize {
        self.signed_url.load(Ordering::SeqCst)
    }
}

/// Fake server. Listing snapshots the server files when the request
/// arrives; mutations apply after their gate (if any) opens.
#[derive(Default)]
pub struct ScriptedApi {
    files: Mutex<Vec<FileEntry>>,
    pub calls: Calls,
    list_gate: Mutex<Option<Arc<Gate>>>,
    delete_gate: Mutex<Option<Arc<Gate>>>,
    url_gate: Mutex<Option<Arc<Gate>>>,
    fail_next_delete: Mutex<Option<RegistryError>>,
    fail_lists: Mutex<Option<RegistryError>>,
    url_ttl_secs: Mutex<Option<i64>>,
}

impl ScriptedApi {
    pub fn with_files(names: &[&str]) -> Arc<Self> {
        let api = Self::default();
        *api.files.lock().unwrap() = names.iter().map(|n| entry(n)).collect();
        Arc::new(api)
    }

    pub fn server_names(&self) -> Vec<String> {
        self.files.lock().unwrap().iter().map(|e| e.name.clone()).collect()
    }

    pub fn gate_lists(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::closed());
        *self.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_deletes(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::closed());
        *self.delete_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_signed_urls(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::closed());
        *self.url_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn fail_next_delete(&self, err: RegistryError) {
        *self.fail_next_delete.lock().unwrap() = Some(err);
    }

    pub fn fail_lists(&self, err: Option<RegistryError>) {
        *self.fail_lists.lock().unwrap() = err;
    }

    /// Lifetime of signed URLs issued from now on (3600 s when unset).
    pub fn set_url_ttl_secs(&self, secs: i64) {
        *self.url_ttl_secs.lock().unwrap() = Some(secs);
    }

    fn gate(slot: &Mutex<Option<Arc<Gate>>>) -> Option<Arc<Gate>> {
        slot.lock().unwrap().clone()
    }

    fn sort(files: &mut [FileEntry]) {
        files.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

pub fn entry(name: &str) -> FileEntry {
    FileEntry {
        id: format!("id-{name}"),
        name: name.to_string(),
        size_bytes: 1024,
        last_accessed_at: "2024-06-01T12:00:00+00:00".to_string(),
    }
}

fn not_found(name: &str) -> RegistryError {
    RegistryError::new(ErrorKind::NotFound, format!("Object not found: {name}"))
}

#[async_trait::async_trait]
impl FileApi for ScriptedApi {
    async fn list(&self, options: ListOptions) -> Result<Vec<FileEntry>, RegistryError> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        let result = match self.fail_lists.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(self
                .files
                .lock()
                .unwrap()
                .iter()
                .skip(options.offset)
                .take(options.limit)
                .cloned()
                .collect()),
        };
        if let Some(gate) = Self::gate(&self.list_gate) {
            gate.pass().await;
        }
        result
    }

    async fn signed_url(&self, name: &str) -> Result<SignedUrl, RegistryError> {
        self.calls.signed_url.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = Self::gate(&self.url_gate) {
            gate.pass().await;
        }
        if !self.server_names().iter().any(|n| n == name) {
            return Err(not_found(name));
        }
        let ttl = self.url_ttl_secs.lock().unwrap().unwrap_or(3600);
        Ok(SignedUrl {
            signed_url: format!("http://storage.test/signed/{name}"),
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(ttl),
        })
    }

    async fn download(&self, name: &str) -> Result<ObjectData, RegistryError> {
        self.calls.download.fetch_add(1, Ordering::SeqCst);
        if !self.server_names().iter().any(|n| n == name) {
            return Err(not_found(name));
        }
        Ok(ObjectData {
            bytes: format!("contents of {name}").into_bytes(),
            content_type: "application/octet-stream".to_string(),
        })
    }

    async fn delete(&self, name: &str) -> Result<FileEntry, RegistryError> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = Self::gate(&self.delete_gate) {
            gate.pass().await;
        }
        if let Some(err) = self.fail_next_delete.lock().unwrap().take() {
            return Err(err);
        }
        let mut files = self.files.lock().unwrap();
        let index = files
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| not_found(name))?;
        Ok(files.remove(index))
    }

    async fn rename(&self, name: &str, new_name: &str) -> Result<FileEntry, RegistryError> {
        self.calls.rename.fetch_add(1, Ordering::SeqCst);
        let mut files = self.files.lock().unwrap();
        if files.iter().any(|e| e.name == new_name) {
            return Err(RegistryError::new(
                ErrorKind::Duplicate,
                "The resource already exists",
            ));
        }
        let file = files
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| not_found(name))?;
        file.name = new_name.to_string();
        let renamed = file.clone();
        Self::sort(&mut files);
        Ok(renamed)
    }

    async fn upload(
        &self,
        file: IncomingFile,
        _intake: Intake,
        progress: ProgressFn,
    ) -> Result<FileEntry, RegistryError> {
        self.calls.upload.fetch_add(1, Ordering::SeqCst);
        progress(50);
        let mut files = self.files.lock().unwrap();
        if files.iter().any(|e| e.name == file.name) {
            return Err(RegistryError::new(
                ErrorKind::Duplicate,
                "The resource already exists",
            ));
        }
        let stored = FileEntry {
            size_bytes: file.bytes.len() as u64,
            ..entry(&file.name)
        };
        files.push(stored.clone());
        Self::sort(&mut files);
        Ok(stored)
    }
}

pub fn owner() -> OwnerId {
    OwnerId::parse("alice").unwrap()
}

pub fn registry(api: &Arc<ScriptedApi>) -> (FileRegistry, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let api: Arc<dyn FileApi> = api.clone();
    (FileRegistry::new(api, owner(), tx), rx)
}

pub fn pdf(name: &str) -> IncomingFile {
    IncomingFile {
        name: name.to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: b"%PDF-1.7 test".to_vec(),
    }
}

/// Poll `cond` until it holds, yielding to other tasks in between.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

/// Drain every notice sent so far.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}
