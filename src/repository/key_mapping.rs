//! `__` → `:` key aliasing.
//!
//! Secret stores and environment variables cannot use `:` in names, so
//! hierarchical keys are conventionally written `Section__Key`. This
//! decorator adds a `Section:Key` alias next to every such key.

use async_trait::async_trait;

use crate::repository::{RepositoryResult, SecretsRepository};
use crate::snapshot::{ConfigurationSnapshot, SecretEntry, KEY_DELIMITER};

/// Delimiter used by the source system in place of `:`.
pub const SOURCE_DELIMITER: &str = "__";

/// Repository decorator adding `:`-delimited aliases.
#[derive(Debug)]
pub struct KeyNormalizingRepository<R> {
    inner: R,
}

impl<R> KeyNormalizingRepository<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: SecretsRepository> SecretsRepository for KeyNormalizingRepository<R> {
    async fn fetch_all(&self) -> RepositoryResult<ConfigurationSnapshot> {
        let snapshot = self.inner.fetch_all().await?;
        Ok(normalize_keys(snapshot))
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

/// Union of the original entries and an alias per `__` key.
///
/// Originals are never removed. When the source also holds the alias key
/// itself, the mapped value overwrites it.
pub fn normalize_keys(snapshot: ConfigurationSnapshot) -> ConfigurationSnapshot {
    let aliases: Vec<SecretEntry> = snapshot
        .iter()
        .filter(|(key, _)| key.contains(SOURCE_DELIMITER))
        .map(|(key, entry)| SecretEntry::new(key.replace(SOURCE_DELIMITER, KEY_DELIMITER), entry.value.clone()))
        .collect();

    if aliases.is_empty() {
        return snapshot;
    }

    // Later entries win.
    snapshot.into_iter().chain(aliases).collect()
}
