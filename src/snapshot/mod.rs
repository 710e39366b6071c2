//! Point-in-time secret sets.
//!
//! # Data Flow
//! ```text
//! repository fetch
//!     → ConfigurationSnapshot (built once, never mutated)
//!     → change.rs compares against the published snapshot
//!     → provider swaps Arc<ConfigurationSnapshot> when different
//! ```
//!
//! # Design Decisions
//! - Snapshots are replaced wholesale; readers never see a partial set
//! - Equality for change detection is by content, not identity

pub mod change;

pub use change::{detect_change, ChangeKind};

use std::collections::hash_map;
use std::collections::HashMap;

/// Separator between hierarchical path segments (`Section:Key`).
pub const KEY_DELIMITER: &str = ":";

/// One secret as returned by the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretEntry {
    pub key: String,
    pub value: String,
}

impl SecretEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Debug for SecretEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretEntry")
            .field("key", &self.key)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Immutable mapping from key to secret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationSnapshot {
    entries: HashMap<String, SecretEntry>,
}

impl ConfigurationSnapshot {
    /// The empty snapshot a provider starts with.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot; a later entry with the same key wins.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = SecretEntry>,
    {
        Self {
            entries: entries.into_iter().map(|e| (e.key.clone(), e)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&SecretEntry> {
        self.entries.get(key)
    }

    /// Value for an exact, case-sensitive key.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, SecretEntry> {
        self.entries.iter()
    }
}

impl FromIterator<SecretEntry> for ConfigurationSnapshot {
    fn from_iter<I: IntoIterator<Item = SecretEntry>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl IntoIterator for ConfigurationSnapshot {
    type Item = SecretEntry;
    type IntoIter = hash_map::IntoValues<String, SecretEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}
