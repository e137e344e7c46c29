//! Object keys and file-name validation.
//!
//! Every object lives under `{ownerId}/{fileName}`. File names are limited
//! to ASCII letters, digits and `! - _ . * ' ( )`.

use std::fmt;

use crate::errors::StorageError;
use crate::identity::OwnerId;

/// Punctuation accepted in file names besides ASCII letters and digits.
pub const ALLOWED_PUNCTUATION: [char; 8] = ['!', '-', '_', '.', '*', '\'', '(', ')'];

/// Shown next to duplicate/invalid-name errors.
pub const ALLOWED_CHARACTERS_HINT: &str =
    "Supported characters: letters (a-z, A-Z), digits (0-9) and ! - _ . * ' ( )";

/// Check a file name against the storage key constraints.
pub fn validate_object_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidKey("file name must not be empty".into()));
    }
    if name == "." || name == ".." {
        return Err(StorageError::InvalidKey(format!("{name:?} is not a file name")));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || ALLOWED_PUNCTUATION.contains(c)))
    {
        return Err(StorageError::InvalidKey(format!(
            "{name:?} contains unsupported character {c:?}"
        )));
    }
    Ok(())
}

/// A validated `{owner}/{name}` storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    owner: OwnerId,
    name: String,
}

impl ObjectKey {
    pub fn new(owner: &OwnerId, name: &str) -> Result<Self, StorageError> {
        validate_object_name(name)?;
        Ok(Self {
            owner: owner.clone(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full storage path, e.g. `alice/report.pdf`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
