//! Client-side ordering of file listings.
//!
//! Sorting never touches the registry cache; it produces a new `Vec` from
//! whatever snapshot the caller holds.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::FileEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    LastAccessed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Column sort state of a file table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortState {
    /// Selecting the active column flips the order; selecting another column
    /// switches to it in ascending order.
    pub fn select(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                order: self.order.toggled(),
            }
        } else {
            Self {
                key,
                order: SortOrder::Asc,
            }
        }
    }

    pub fn apply(&self, entries: &[FileEntry]) -> Vec<FileEntry> {
        sorted(entries, self.key, self.order)
    }
}

fn compare(a: &FileEntry, b: &FileEntry, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Size => a.size_bytes.cmp(&b.size_bytes),
        // RFC 3339 strings in the same offset order lexicographically.
        SortKey::LastAccessed => a.last_accessed_at.cmp(&b.last_accessed_at),
    }
}

/// Return a sorted copy of `entries`. The sort is stable.
pub fn sorted(entries: &[FileEntry], key: SortKey, order: SortOrder) -> Vec<FileEntry> {
    let mut out = entries.to_vec();
    out.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    out
}
