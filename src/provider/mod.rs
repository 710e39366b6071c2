//! Configuration provider.
//!
//! # Data Flow
//! ```text
//! load() ───────────────┐
//! PollingScheduler tick ─┴→ repository.fetch_all() (deadline)
//!                            → detect_change(current, fetched)
//!                            → unchanged: discard
//!                            → changed: swap generation, fire old ReloadSignal
//!
//! Readers (any thread):
//!     try_get / get_children → current generation (lock-free load)
//!     reload_token           → signal of the current generation
//! ```
//!
//! # Design Decisions
//! - Snapshot and signal live in one `Generation` behind an `ArcSwap`, so a
//!   reader sees either the old pair or the new pair, never a mix
//! - The new generation is published before the old signal fires
//! - Refresh cycles are single-flight; a cycle that finds one running skips
//! - Only the first load reports failures; refresh failures are logged and
//!   the stale snapshot keeps being served

pub mod lookup;
pub mod polling;
pub mod signal;
pub mod state;

pub use lookup::child_segments;
pub use polling::PollingScheduler;
pub use signal::{ReloadSignal, ReloadToken};
pub use state::ProviderState;

use arc_swap::ArcSwap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::backend::{BackendError, HttpBackendClient, SecretsBackendClient};
use crate::config::{validate_options, RepositoryOptions, ValidatedOptions, ValidationError, BOOTSTRAP_SECTION};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::repository::{
    BackendSecretsRepository, KeyNormalizingRepository, RepositoryError, SecretsRepository,
};
use crate::resilience::{with_deadline, DeadlineExceeded, LoadTimeout};
use crate::snapshot::{detect_change, ConfigurationSnapshot};

/// Errors surfaced by the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Backend setup failed: {0}")]
    Backend(#[from] BackendError),

    /// The initial load did not finish in time.
    #[error("Loading secrets timed out after {0:?}")]
    LoadTimeout(Duration),

    /// The initial load failed.
    #[error("Failed loading secrets: {0}")]
    Fetch(#[from] RepositoryError),

    /// Writes are not supported; the provider is read-only.
    #[error("Setting values is not supported by the secrets provider")]
    Unsupported,

    #[error("Provider has been shut down")]
    ShutDown,
}

/// Provider-level settings (the repository has its own).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Refresh interval; `None` disables background refresh.
    pub polling_interval: Option<Duration>,
    /// Deadline for the initial load and for every refresh fetch.
    pub load_timeout: LoadTimeout,
    /// Section hidden from root enumeration (the provider's own options).
    pub bootstrap_section: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            polling_interval: None,
            load_timeout: LoadTimeout::default(),
            bootstrap_section: Some(BOOTSTRAP_SECTION.to_string()),
        }
    }
}

impl ProviderSettings {
    pub fn from_validated(options: &ValidatedOptions) -> Self {
        Self {
            polling_interval: options.polling_interval,
            load_timeout: options.load_timeout,
            ..Self::default()
        }
    }
}

/// A published snapshot together with the signal that fires when it is replaced.
struct Generation {
    snapshot: Arc<ConfigurationSnapshot>,
    signal: ReloadSignal,
}

impl Generation {
    fn new(snapshot: Arc<ConfigurationSnapshot>) -> Self {
        Self {
            snapshot,
            signal: ReloadSignal::new(),
        }
    }
}

struct ProviderInner {
    repository: Arc<dyn SecretsRepository>,
    current: ArcSwap<Generation>,
    state: AtomicU8,
    /// Held for the duration of a load or refresh cycle.
    flight: tokio::sync::Mutex<()>,
    settings: ProviderSettings,
    shutdown: Shutdown,
}

impl ProviderInner {
    fn state(&self) -> ProviderState {
        ProviderState::from(self.state.load(Ordering::Acquire))
    }

    /// Move to `to` unless the provider has been shut down.
    fn transition(&self, to: ProviderState) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != ProviderState::ShutDown as u8).then_some(to as u8)
            });
    }

    async fn fetch(&self) -> Result<ConfigurationSnapshot, ProviderError> {
        tracing::trace!(timeout = %self.settings.load_timeout, "Loading secrets with timeout");

        match with_deadline(self.settings.load_timeout, self.repository.fetch_all()).await {
            Ok(Ok(snapshot)) => {
                tracing::trace!("Successfully loaded secrets");
                Ok(snapshot)
            }
            Ok(Err(e)) => Err(ProviderError::Fetch(e)),
            Err(DeadlineExceeded(limit)) => Err(ProviderError::LoadTimeout(limit)),
        }
    }

    /// Publish `snapshot` if its content differs from the current one.
    ///
    /// Callers hold `flight`, so there is a single writer.
    fn publish_if_changed(&self, snapshot: ConfigurationSnapshot) -> bool {
        let current = self.current.load();

        let Some(reason) = detect_change(&current.snapshot, &snapshot) else {
            tracing::trace!("Secrets have not changed");
            return false;
        };

        tracing::trace!(reason = %reason, "Secrets appear to have changed");
        tracing::debug!(entries = snapshot.len(), "Using updated secrets");

        let entries = snapshot.len();
        let previous = self.current.swap(Arc::new(Generation::new(Arc::new(snapshot))));
        previous.signal.fire();

        metrics::record_reload(entries);
        true
    }

    /// One refresh cycle. Failures are logged, never returned.
    async fn refresh(&self) -> bool {
        if self.shutdown.is_triggered() || !self.state().is_serving() {
            return false;
        }

        let Ok(_flight) = self.flight.try_lock() else {
            tracing::trace!("Refresh already in progress, skipping");
            return false;
        };

        tracing::trace!("Checking for changes");
        self.transition(ProviderState::Refreshing);

        match self.fetch().await {
            Ok(snapshot) => {
                if self.shutdown.is_triggered() {
                    tracing::debug!("Discarding secrets fetched during shutdown");
                    return false;
                }

                let changed = self.publish_if_changed(snapshot);
                metrics::record_refresh(if changed { "changed" } else { "unchanged" });
                self.transition(ProviderState::Loaded);
                changed
            }
            Err(ProviderError::LoadTimeout(limit)) => {
                tracing::warn!(timeout = ?limit, "Failed loading secrets (timed out)");
                metrics::record_refresh("timeout");
                self.transition(ProviderState::Degraded);
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed loading secrets, keeping previous secrets");
                metrics::record_refresh("failed");
                self.transition(ProviderState::Degraded);
                false
            }
        }
    }
}

/// Read-only hierarchical configuration backed by a secrets repository.
pub struct ConfigurationProvider {
    inner: Arc<ProviderInner>,
    scheduler: Mutex<Option<PollingScheduler>>,
}

impl ConfigurationProvider {
    /// Create a provider over `repository`. Nothing is fetched until `load`.
    pub fn new(repository: Arc<dyn SecretsRepository>, settings: ProviderSettings) -> Self {
        let inner = ProviderInner {
            repository,
            current: ArcSwap::from_pointee(Generation::new(Arc::new(ConfigurationSnapshot::empty()))),
            state: AtomicU8::new(ProviderState::Uninitialized as u8),
            flight: tokio::sync::Mutex::new(()),
            settings,
            shutdown: Shutdown::new(),
        };

        Self {
            inner: Arc::new(inner),
            scheduler: Mutex::new(None),
        }
    }

    /// Validate `options` and compose repository, key mapping and provider
    /// around `client`.
    pub fn from_options(
        options: &RepositoryOptions,
        client: Arc<dyn SecretsBackendClient>,
    ) -> Result<Self, ProviderError> {
        let validated = validate_options(options)?;
        Ok(Self::from_validated(validated, client))
    }

    /// Like `from_options`, talking to the configured site over HTTP.
    pub fn with_http_backend(options: &RepositoryOptions) -> Result<Self, ProviderError> {
        let validated = validate_options(options)?;
        let client = HttpBackendClient::from_options(&validated)?;
        Ok(Self::from_validated(validated, Arc::new(client)))
    }

    fn from_validated(options: ValidatedOptions, client: Arc<dyn SecretsBackendClient>) -> Self {
        let settings = ProviderSettings::from_validated(&options);
        let key_mapping = options.key_mapping;
        let repository = BackendSecretsRepository::from_validated(options, client);

        let repository: Arc<dyn SecretsRepository> = if key_mapping {
            Arc::new(KeyNormalizingRepository::new(repository))
        } else {
            Arc::new(repository)
        };

        Self::new(repository, settings)
    }

    /// Fetch the secret set and start background refresh.
    ///
    /// Failures and timeouts are returned to the caller. On the first load
    /// the provider then stays `Uninitialized`.
    pub async fn load(&self) -> Result<(), ProviderError> {
        if self.inner.shutdown.is_triggered() {
            return Err(ProviderError::ShutDown);
        }

        let flight = self.inner.flight.lock().await;
        tracing::trace!("Initially loading secrets");

        let snapshot = match self.inner.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Failed loading secrets");
                return Err(e);
            }
        };

        if self.inner.state() == ProviderState::Uninitialized {
            // First generation: replace the empty snapshot, keep the signal
            // consumers may already hold.
            let entries = snapshot.len();
            let signal = self.inner.current.load().signal.clone();
            self.inner.current.store(Arc::new(Generation {
                snapshot: Arc::new(snapshot),
                signal,
            }));
            metrics::record_snapshot_size(entries);
            tracing::debug!(entries, "Loaded initial secrets");
        } else {
            self.inner.publish_if_changed(snapshot);
        }

        self.inner.transition(ProviderState::Loaded);
        drop(flight);

        self.start_polling();
        Ok(())
    }

    fn start_polling(&self) {
        let Some(interval) = self.inner.settings.polling_interval else {
            return;
        };
        let Ok(mut slot) = self.scheduler.lock() else {
            return;
        };
        if slot.is_some() || self.inner.shutdown.is_triggered() {
            return;
        }

        let inner = self.inner.clone();
        *slot = Some(PollingScheduler::start(interval, &self.inner.shutdown, move || {
            let inner = inner.clone();
            async move {
                inner.refresh().await;
            }
        }));
    }

    /// Run one refresh cycle now. Returns whether a change was published.
    ///
    /// Never fails; skips when a cycle is already running or nothing has
    /// been loaded yet.
    pub async fn refresh(&self) -> bool {
        self.inner.refresh().await
    }

    /// Exact, case-sensitive lookup.
    pub fn try_get(&self, key: &str) -> Option<String> {
        self.inner.current.load().snapshot.value(key).map(str::to_string)
    }

    /// Immediate child segments below `prefix` (empty prefix for the root).
    pub fn get_children(&self, prefix: &str) -> BTreeSet<String> {
        let generation = self.inner.current.load();
        child_segments(
            &generation.snapshot,
            prefix,
            self.inner.settings.bootstrap_section.as_deref(),
        )
    }

    /// Child keys in a chain of providers: keys found by earlier providers
    /// pass through, then this provider's children are appended.
    ///
    /// At the root, earlier keys belonging to the bootstrap section are dropped.
    pub fn child_keys<I>(&self, earlier_keys: I, parent: Option<&str>) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let parent = parent.unwrap_or_default();
        let excluded = self.inner.settings.bootstrap_section.as_deref();

        let mut keys: Vec<String> = earlier_keys
            .into_iter()
            .filter(|key| {
                !(parent.is_empty()
                    && excluded.is_some_and(|section| lookup::has_section_prefix(key, section)))
            })
            .collect();

        keys.extend(self.get_children(parent));
        keys
    }

    /// Writes always fail.
    pub fn set(&self, _key: &str, _value: Option<&str>) -> Result<(), ProviderError> {
        Err(ProviderError::Unsupported)
    }

    /// Token that fires when the current snapshot is replaced.
    ///
    /// A token fires once. Call again after it fires to observe later changes.
    pub fn reload_token(&self) -> ReloadToken {
        self.inner.current.load().signal.token()
    }

    /// The snapshot currently served.
    pub fn snapshot(&self) -> Arc<ConfigurationSnapshot> {
        self.inner.current.load().snapshot.clone()
    }

    pub fn state(&self) -> ProviderState {
        self.inner.state()
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.inner.settings
    }

    /// Stop background refresh and release the backend session.
    ///
    /// A background refresh still running is aborted; its result would be
    /// discarded anyway.
    pub async fn shutdown(&self) {
        self.inner.shutdown.trigger();
        self.inner
            .state
            .store(ProviderState::ShutDown as u8, Ordering::Release);

        let scheduler = self.scheduler.lock().ok().and_then(|mut slot| slot.take());
        if let Some(scheduler) = scheduler {
            scheduler.stop().await;
        }

        self.inner.repository.close().await;
        tracing::info!("Configuration provider stopped");
    }
}

impl Drop for ConfigurationProvider {
    fn drop(&mut self) {
        self.inner.shutdown.trigger();
    }
}

impl std::fmt::Debug for ConfigurationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationProvider")
            .field("state", &self.state())
            .field("entries", &self.inner.current.load().snapshot.len())
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}
