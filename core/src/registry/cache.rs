//! The registry's local view of the owner's file collection.
//!
//! Every mutation bumps `generation`. A list fetch records the generation
//! it started under and its response is only applied if nothing has been
//! mutated since, so a slow pre-mutation response can never overwrite the
//! post-mutation state.

use serde::Serialize;

use crate::errors::RegistryError;
use crate::files::FileEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Freshness {
    /// A listing request is outstanding (or none has been made yet).
    Pending,
    Fresh,
    Error,
}

/// Read-only copy of the cache handed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot {
    pub entries: Vec<FileEntry>,
    pub freshness: Freshness,
    pub stale: bool,
    pub initialized: bool,
    pub last_error: Option<RegistryError>,
}

impl CacheSnapshot {
    /// A completed listing with no files, as opposed to one still loading.
    pub fn is_fresh_and_empty(&self) -> bool {
        self.freshness == Freshness::Fresh && self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }
}

#[derive(Debug)]
pub(crate) struct FileListCache {
    entries: Vec<FileEntry>,
    freshness: Freshness,
    stale: bool,
    initialized: bool,
    last_error: Option<RegistryError>,
    generation: u64,
}

impl FileListCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            freshness: Freshness::Pending,
            stale: true,
            initialized: false,
            last_error: None,
            generation: 0,
        }
    }

    /// Entries that may be served without a request.
    pub(crate) fn servable(&self) -> Option<Vec<FileEntry>> {
        (self.initialized && !self.stale && self.freshness == Freshness::Fresh)
            .then(|| self.entries.clone())
    }

    /// Mark a fetch as started and return the generation it belongs to.
    pub(crate) fn begin_fetch(&mut self) -> u64 {
        self.freshness = Freshness::Pending;
        self.generation
    }

    /// Apply a finished fetch. Returns `false` when the response was
    /// discarded because a mutation started after the fetch did.
    pub(crate) fn complete_fetch(
        &mut self,
        generation: u64,
        result: &Result<Vec<FileEntry>, RegistryError>,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        match result {
            Ok(entries) => {
                self.entries = entries.clone();
                self.freshness = Freshness::Fresh;
                self.stale = false;
                self.initialized = true;
                self.last_error = None;
            }
            Err(err) => {
                self.freshness = Freshness::Error;
                self.last_error = Some(err.clone());
            }
        }
        true
    }

    /// Invalidate at the start and again at the end of every mutation.
    pub(crate) fn invalidate(&mut self) {
        self.stale = true;
        self.generation += 1;
    }

    pub(crate) fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }

    pub(crate) fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            entries: self.entries.clone(),
            freshness: self.freshness,
            stale: self.stale,
            initialized: self.initialized,
            last_error: self.last_error.clone(),
        }
    }

    /// Drop everything; the generation keeps counting so fetches started
    /// before the reset are discarded.
    pub(crate) fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self::new();
        self.generation = generation;
    }
}
