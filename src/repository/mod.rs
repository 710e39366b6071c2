//! Secret repositories.
//!
//! # Data Flow
//! ```text
//! provider refresh cycle
//!     → SecretsRepository::fetch_all
//!         KeyNormalizingRepository (adds `:` aliases for `__` keys)
//!             → BackendSecretsRepository (session, retry/backoff)
//!                 → SecretsBackendClient
//!     → ConfigurationSnapshot
//! ```
//!
//! # Design Decisions
//! - Decorators wrap an inner repository instead of extending it
//! - A repository returns a complete snapshot or an error, never a partial set

pub mod key_mapping;
pub mod remote;
pub mod types;

pub use key_mapping::KeyNormalizingRepository;
pub use remote::BackendSecretsRepository;
pub use types::{RepositoryError, RepositoryResult};

use async_trait::async_trait;
use std::sync::Arc;

use crate::snapshot::ConfigurationSnapshot;

/// Source of complete secret sets.
#[async_trait]
pub trait SecretsRepository: Send + Sync {
    /// Fetch every secret of the configured project/environment.
    async fn fetch_all(&self) -> RepositoryResult<ConfigurationSnapshot>;

    /// Release the backend session. Later fetches fail.
    async fn close(&self) {}
}

#[async_trait]
impl<R: SecretsRepository + ?Sized> SecretsRepository for Arc<R> {
    async fn fetch_all(&self) -> RepositoryResult<ConfigurationSnapshot> {
        (**self).fetch_all().await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
