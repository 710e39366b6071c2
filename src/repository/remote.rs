//! Repository backed by a remote secrets API.
//!
//! # Responsibilities
//! - Validate options once, at construction
//! - Hold the backend session; log in lazily or eagerly
//! - Retry transient failures with backoff, abort on rejected credentials
//!
//! # Design Decisions
//! - A failed eager login does not fail construction; fetches keep failing
//!   until the credentials work, and each fetch tries to log in again
//! - A rejected token drops the session so the next fetch logs in afresh

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::backend::{BackendError, SecretsBackendClient, Session};
use crate::config::{validate_options, RepositoryOptions, ValidatedOptions};
use crate::observability::metrics;
use crate::repository::{RepositoryError, RepositoryResult, SecretsRepository};
use crate::resilience::RetryPolicy;
use crate::snapshot::{ConfigurationSnapshot, SecretEntry};

/// Fetches the full secret set of one project/environment.
pub struct BackendSecretsRepository {
    client: Arc<dyn SecretsBackendClient>,
    options: ValidatedOptions,
    session: Mutex<Option<Session>>,
    retry: RetryPolicy,
    closed: AtomicBool,
}

impl BackendSecretsRepository {
    /// Validate `options` and build a repository that logs in on first fetch.
    pub fn new(
        options: &RepositoryOptions,
        client: Arc<dyn SecretsBackendClient>,
    ) -> RepositoryResult<Self> {
        let options = validate_options(options)?;
        Ok(Self::from_validated(options, client))
    }

    pub fn from_validated(options: ValidatedOptions, client: Arc<dyn SecretsBackendClient>) -> Self {
        Self {
            client,
            options,
            session: Mutex::new(None),
            retry: RetryPolicy::default(),
            closed: AtomicBool::new(false),
        }
    }

    /// Validate `options`, build the repository and log in right away.
    ///
    /// Only validation failures are returned; a failed login is logged.
    pub async fn connect(
        options: &RepositoryOptions,
        client: Arc<dyn SecretsBackendClient>,
    ) -> RepositoryResult<Self> {
        let repository = Self::new(options, client)?;

        if let Err(e) = repository.session().await {
            tracing::error!(
                site_url = %repository.options.site_url,
                error = %e,
                "Failed to log into secrets instance"
            );
        }

        Ok(repository)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn options(&self) -> &ValidatedOptions {
        &self.options
    }

    /// Whether a usable session is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| !s.is_expired())
    }

    async fn session(&self) -> Result<Session, BackendError> {
        let mut held = self.session.lock().await;
        if let Some(session) = held.as_ref().filter(|s| !s.is_expired()) {
            return Ok(session.clone());
        }

        tracing::debug!(
            site_url = %self.options.site_url,
            environment = %self.options.environment_slug,
            "Connecting to secrets instance"
        );

        let session = self.client.authenticate(&self.options.credentials).await?;
        *held = Some(session.clone());
        Ok(session)
    }

    async fn try_fetch(&self) -> Result<Vec<SecretEntry>, BackendError> {
        let session = self.session().await?;
        self.client
            .list_secrets(&session, &self.options.project_id, &self.options.environment_slug)
            .await
    }
}

#[async_trait]
impl SecretsRepository for BackendSecretsRepository {
    async fn fetch_all(&self) -> RepositoryResult<ConfigurationSnapshot> {
        let mut failures = 0u32;

        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(RepositoryError::Closed);
            }

            match self.try_fetch().await {
                Ok(entries) => {
                    metrics::record_fetch_attempt("success");
                    tracing::trace!(count = entries.len(), attempts = failures + 1, "Loaded secrets");
                    return Ok(ConfigurationSnapshot::from_entries(entries));
                }
                Err(e) if e.is_permanent() => {
                    metrics::record_fetch_attempt("unauthorized");
                    tracing::error!(
                        error = %e,
                        "Failed to load secrets: check credentials to secrets instance"
                    );
                    *self.session.lock().await = None;
                    return Err(RepositoryError::Authentication(e.to_string()));
                }
                Err(e) => {
                    metrics::record_fetch_attempt("transient");
                    failures += 1;
                    tracing::warn!(attempt = failures, error = %e, "Failed to load secrets");

                    if !self.retry.should_retry(failures) {
                        tracing::error!(attempts = failures, error = %e, "Max retries exceeded");
                        return Err(RepositoryError::RetriesExhausted {
                            attempts: failures,
                            last_error: e,
                        });
                    }

                    tokio::time::sleep(self.retry.delay(failures)).await;
                }
            }
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        *self.session.lock().await = None;
        tracing::debug!("Secrets repository closed");
    }
}

impl std::fmt::Debug for BackendSecretsRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSecretsRepository")
            .field("options", &self.options)
            .field("retry", &self.retry)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
