//! Hierarchical, polling-refreshed configuration backed by a flat secret store.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                      ConfigurationProvider                        │
//!   │   try_get / get_children / reload_token      (readers, lock-free) │
//!   │                 ▲                                                 │
//!   │                 │ ArcSwap<Generation{snapshot, signal}>           │
//!   │   load() / PollingScheduler ──▶ detect_change ──▶ swap + fire     │
//!   └─────────────────┬────────────────────────────────────────────────┘
//!                     ▼
//!   KeyNormalizingRepository (`A__B` → also `A:B`)
//!                     ▼
//!   BackendSecretsRepository (validation, session, retry/backoff)
//!                     ▼
//!   SecretsBackendClient (HttpBackendClient │ InMemoryBackend)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use infisical_config::{ConfigurationProvider, RepositoryOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = RepositoryOptions::new()
//!     .with_site_url("https://secrets.example.com")
//!     .with_project_id("project-id")
//!     .with_client_credentials("client-id", "client-secret")
//!     .with_polling_interval(30_000);
//!
//! let provider = ConfigurationProvider::with_http_backend(&options)?;
//! provider.load().await?;
//!
//! let host = provider.try_get("Database:Host");
//! let sections = provider.get_children("");
//!
//! // Fires once; take a new token after each change.
//! provider.reload_token().changed().await;
//! # let _ = (host, sections);
//! # Ok(())
//! # }
//! ```

// Core subsystems
pub mod backend;
pub mod config;
pub mod provider;
pub mod repository;
pub mod snapshot;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use backend::{BackendError, HttpBackendClient, InMemoryBackend, SecretsBackendClient, Session};
pub use config::{RepositoryOptions, ValidationError};
pub use provider::{ConfigurationProvider, ProviderError, ProviderSettings, ProviderState, ReloadToken};
pub use repository::{BackendSecretsRepository, KeyNormalizingRepository, RepositoryError, SecretsRepository};
pub use snapshot::{ConfigurationSnapshot, SecretEntry};
