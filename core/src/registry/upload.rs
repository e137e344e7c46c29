//! Per-file status of the current upload batch.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum UploadStatus {
    Uploading { percent: u8 },
    Success,
    Error { reason: String },
}

impl UploadStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Uploading { .. })
    }
}

/// Status records keyed by file name.
#[derive(Debug, Default)]
pub struct UploadTracker {
    records: Mutex<BTreeMap<String, UploadStatus>>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, name: &str, status: UploadStatus) {
        let mut records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        records.insert(name.to_string(), status);
    }

    pub fn start(&self, name: &str) {
        self.set(name, UploadStatus::Uploading { percent: 0 });
    }

    /// Record progress. Ignored once the upload has finished, so a late
    /// progress callback cannot overwrite the final state.
    pub fn progress(&self, name: &str, percent: u8) {
        let mut records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(status @ UploadStatus::Uploading { .. }) = records.get_mut(name) {
            *status = UploadStatus::Uploading {
                percent: percent.min(100),
            };
        }
    }

    pub fn succeed(&self, name: &str) {
        self.set(name, UploadStatus::Success);
    }

    pub fn fail(&self, name: &str, reason: impl Into<String>) {
        self.set(
            name,
            UploadStatus::Error {
                reason: reason.into(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<UploadStatus> {
        let records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        records.get(name).cloned()
    }

    /// All records, ordered by file name.
    pub fn snapshot(&self) -> Vec<(String, UploadStatus)> {
        let records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        records
            .iter()
            .map(|(name, status)| (name.clone(), status.clone()))
            .collect()
    }

    /// Drop finished records, keeping uploads still in progress.
    pub fn clear_finished(&self) {
        let mut records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        records.retain(|_, status| !status.is_finished());
    }

    pub fn clear(&self) {
        self.records.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }
}
