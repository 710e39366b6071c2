//! Process-local secrets backend.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::backend::{BackendError, SecretsBackendClient, Session};
use crate::config::Credentials;
use crate::snapshot::SecretEntry;

type Scope = (String, String);

/// Secrets held in memory, keyed by (project, environment).
///
/// Accepts any credentials. Useful for local development and for exercising
/// the refresh loop without a server.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    scopes: RwLock<HashMap<Scope, BTreeMap<String, String>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a secret.
    pub fn insert(&self, project_id: &str, environment: &str, key: &str, value: &str) {
        if let Ok(mut scopes) = self.scopes.write() {
            scopes
                .entry((project_id.to_string(), environment.to_string()))
                .or_default()
                .insert(key.to_string(), value.to_string());
        }
    }

    /// Remove a secret; returns whether it existed.
    pub fn remove(&self, project_id: &str, environment: &str, key: &str) -> bool {
        let Ok(mut scopes) = self.scopes.write() else {
            return false;
        };
        scopes
            .get_mut(&(project_id.to_string(), environment.to_string()))
            .and_then(|secrets| secrets.remove(key))
            .is_some()
    }
}

#[async_trait]
impl SecretsBackendClient for InMemoryBackend {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<Session, BackendError> {
        Ok(Session::new("in-memory", None))
    }

    async fn list_secrets(
        &self,
        _session: &Session,
        project_id: &str,
        environment: &str,
    ) -> Result<Vec<SecretEntry>, BackendError> {
        let scopes = self
            .scopes
            .read()
            .map_err(|_| BackendError::Transport("in-memory store poisoned".to_string()))?;

        Ok(scopes
            .get(&(project_id.to_string(), environment.to_string()))
            .map(|secrets| {
                secrets
                    .iter()
                    .map(|(k, v)| SecretEntry::new(k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
