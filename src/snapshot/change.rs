//! Content diff between two snapshots.

use crate::snapshot::ConfigurationSnapshot;

/// Why a fetched snapshot differs from the published one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// Entry counts differ (keys added or removed).
    CountChanged { previous: usize, current: usize },
    /// Same count, but a key is new.
    KeyAdded(String),
    /// A shared key holds a different value.
    ValueChanged(String),
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::CountChanged { previous, current } => {
                write!(f, "different counts ({} -> {})", previous, current)
            }
            ChangeKind::KeyAdded(key) => write!(f, "new secret {}", key),
            ChangeKind::ValueChanged(key) => write!(f, "different value for {}", key),
        }
    }
}

/// Compare `current` (freshly fetched) against `previous` (published).
///
/// Returns the first difference found, or `None` when both hold the same
/// key/value pairs. Equal counts with no new key imply no removed key.
pub fn detect_change(
    previous: &ConfigurationSnapshot,
    current: &ConfigurationSnapshot,
) -> Option<ChangeKind> {
    if previous.len() != current.len() {
        return Some(ChangeKind::CountChanged {
            previous: previous.len(),
            current: current.len(),
        });
    }

    for (key, entry) in current.iter() {
        match previous.get(key) {
            None => return Some(ChangeKind::KeyAdded(key.clone())),
            Some(old) if old.value != entry.value => {
                return Some(ChangeKind::ValueChanged(key.clone()))
            }
            Some(_) => {}
        }
    }

    None
}
