//! Infisical REST client.
//!
//! # Responsibilities
//! - Universal-auth login (`/api/v1/auth/universal-auth/login`)
//! - Raw secret listing (`/api/v3/secrets/raw`)
//! - Map HTTP statuses onto `BackendError`
//! - Serve repeated listings from a short-lived cache when `CacheTtl` is set

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::backend::{BackendError, SecretsBackendClient, Session};
use crate::config::{Credentials, ValidatedOptions};
use crate::snapshot::SecretEntry;

const LOGIN_PATH: &str = "/api/v1/auth/universal-auth/login";
const SECRETS_PATH: &str = "/api/v3/secrets/raw";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    /// Seconds.
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ListSecretsResponse {
    secrets: Vec<RawSecret>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSecret {
    secret_key: String,
    #[serde(default)]
    secret_value: String,
}

struct CachedListing {
    project_id: String,
    environment: String,
    fetched_at: Instant,
    secrets: Vec<SecretEntry>,
}

/// `SecretsBackendClient` for an Infisical instance.
pub struct HttpBackendClient {
    client: Client,
    site_url: String,
    cache_ttl: Option<Duration>,
    cache: Mutex<Option<CachedListing>>,
}

impl HttpBackendClient {
    /// Create a client for `site_url` (scheme, host and port only).
    pub fn new(
        site_url: impl Into<String>,
        user_agent: Option<&str>,
        cache_ttl: Option<Duration>,
    ) -> Result<Self, BackendError> {
        let user_agent = user_agent
            .map(str::to_string)
            .unwrap_or_else(|| format!("infisical-config/{}", env!("CARGO_PKG_VERSION")));

        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            site_url: site_url.into(),
            cache_ttl,
            cache: Mutex::new(None),
        })
    }

    pub fn from_options(options: &ValidatedOptions) -> Result<Self, BackendError> {
        Self::new(
            options.site_url.clone(),
            options.user_agent.as_deref(),
            options.cache_ttl,
        )
    }

    fn cached(&self, project_id: &str, environment: &str) -> Option<Vec<SecretEntry>> {
        let ttl = self.cache_ttl?;
        let guard = self.cache.lock().ok()?;
        let listing = guard.as_ref()?;

        if listing.fetched_at.elapsed() < ttl
            && listing.project_id == project_id
            && listing.environment == environment
        {
            Some(listing.secrets.clone())
        } else {
            None
        }
    }

    fn store(&self, project_id: &str, environment: &str, secrets: &[SecretEntry]) {
        if self.cache_ttl.is_none() {
            return;
        }
        if let Ok(mut guard) = self.cache.lock() {
            *guard = Some(CachedListing {
                project_id: project_id.to_string(),
                environment: environment.to_string(),
                fetched_at: Instant::now(),
                secrets: secrets.to_vec(),
            });
        }
    }
}

#[async_trait]
impl SecretsBackendClient for HttpBackendClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, BackendError> {
        let (client_id, client_secret) = match credentials {
            Credentials::AccessToken(token) => return Ok(Session::new(token.clone(), None)),
            Credentials::ClientCredentials { client_id, client_secret } => (client_id, client_secret),
        };

        let response = self
            .client
            .post(format!("{}{}", self.site_url, LOGIN_PATH))
            .json(&serde_json::json!({
                "clientId": client_id,
                "clientSecret": client_secret,
            }))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        // A malformed credential pair is rejected with 400 at login.
        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Unauthorized(body));
        }
        let response = check_status(response).await?;

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        tracing::debug!(expires_in = ?login.expires_in, "Universal auth login succeeded");
        Ok(Session::new(login.access_token, login.expires_in.map(Duration::from_secs)))
    }

    async fn list_secrets(
        &self,
        session: &Session,
        project_id: &str,
        environment: &str,
    ) -> Result<Vec<SecretEntry>, BackendError> {
        if let Some(secrets) = self.cached(project_id, environment) {
            tracing::trace!(count = secrets.len(), "Serving secrets from client cache");
            return Ok(secrets);
        }

        let response = self
            .client
            .get(format!("{}{}", self.site_url, SECRETS_PATH))
            .bearer_auth(session.token())
            .query(&[
                ("workspaceId", project_id),
                ("environment", environment),
                ("secretPath", "/"),
            ])
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let listing: ListSecretsResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let secrets: Vec<SecretEntry> = listing
            .secrets
            .into_iter()
            .map(|s| SecretEntry::new(s.secret_key, s.secret_value))
            .collect();

        self.store(project_id, environment, &secrets);
        Ok(secrets)
    }
}

async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BackendError::Unauthorized(body)),
        _ => Err(BackendError::Status {
            status: status.as_u16(),
            body,
        }),
    }
}
