//! Secrets backend boundary.
//!
//! # Data Flow
//! ```text
//! repository
//!     → SecretsBackendClient::authenticate (credentials → Session)
//!     → SecretsBackendClient::list_secrets (session, project, environment → entries)
//!
//! Implementations:
//!     http.rs   → Infisical REST API over reqwest
//!     memory.rs → process-local map (development, tests)
//! ```
//!
//! # Design Decisions
//! - The client is stateless with respect to sessions; the repository owns them
//! - Errors carry their own retry classification (`is_permanent`)

pub mod http;
pub mod memory;

pub use http::HttpBackendClient;
pub use memory::InMemoryBackend;

use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::Credentials;
use crate::snapshot::SecretEntry;

/// Errors reported by a secrets backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Credentials or token were rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Connection, DNS or TLS failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success response that is not an auth rejection.
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl BackendError {
    /// Permanent errors cannot be fixed by retrying.
    pub fn is_permanent(&self) -> bool {
        matches!(self, BackendError::Unauthorized(_))
    }
}

/// An authenticated session.
#[derive(Clone)]
pub struct Session {
    token: String,
    expires_at: Option<Instant>,
}

impl Session {
    pub fn new(token: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self {
            token: token.into(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Network API of a key/value secret store.
#[async_trait]
pub trait SecretsBackendClient: Send + Sync {
    /// Exchange credentials for a session.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, BackendError>;

    /// List every secret of one project/environment.
    async fn list_secrets(
        &self,
        session: &Session,
        project_id: &str,
        environment: &str,
    ) -> Result<Vec<SecretEntry>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(BackendError::Unauthorized("bad".into()).is_permanent());
        assert!(!BackendError::Transport("reset".into()).is_permanent());
        assert!(!BackendError::Status { status: 503, body: String::new() }.is_permanent());
        assert!(!BackendError::Decode("eof".into()).is_permanent());
    }

    #[test]
    fn test_session_expiry() {
        assert!(!Session::new("t", None).is_expired());
        assert!(Session::new("t", Some(Duration::ZERO)).is_expired());
        assert!(!Session::new("t", Some(Duration::from_secs(60))).is_expired());
        assert!(!format!("{:?}", Session::new("secret-token", None)).contains("secret-token"));
    }
}
