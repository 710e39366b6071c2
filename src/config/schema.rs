//! Configuration schema definitions.
//!
//! `RepositoryOptions` is the raw, unvalidated option block read from the
//! `[Infisical]` section of a config file or built in code. Field names
//! serialize in PascalCase so the same keys work in TOML and in hierarchical
//! configuration (`Infisical:SiteUrl`).

use serde::{Deserialize, Serialize};

/// Name of the configuration section holding the provider's own options.
pub const BOOTSTRAP_SECTION: &str = "Infisical";

/// Environment name used when none is configured.
pub const DEFAULT_ENVIRONMENT: &str = "Development";

/// Options for connecting to one project/environment of the secrets backend.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct RepositoryOptions {
    /// Universal-auth client id.
    pub client_id: Option<String>,

    /// Universal-auth client secret.
    pub client_secret: Option<String>,

    /// Pre-issued access token; replaces the client credential login.
    pub access_token: Option<String>,

    /// Base URL of the secrets instance (https, or http on localhost).
    pub site_url: Option<String>,

    /// Project (workspace) identifier.
    pub project_id: Option<String>,

    /// Environment name, e.g. "Development" or "prod".
    pub environment_name: String,

    /// How long a secret listing may be served from the client cache (ms).
    pub cache_ttl: Option<u64>,

    /// User-Agent header sent to the backend.
    pub user_agent: Option<String>,

    /// Background refresh interval (ms). `None` disables polling.
    pub polling_interval: Option<u64>,

    /// Deadline for a single load (ms). `None` means 5s, negative means unbounded.
    pub load_timeout: Option<i64>,

    /// Add `:`-delimited aliases for `__`-delimited keys.
    pub enable_key_mapping: Option<bool>,

    /// Legacy switch; when `true` it wins over `EnableKeyMapping`.
    pub disable_double_underscore_to_colon_mapping: Option<bool>,

    /// Skip the `development -> dev` / `production -> prod` aliases.
    pub disable_environment_aliases: bool,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            access_token: None,
            site_url: None,
            project_id: None,
            environment_name: DEFAULT_ENVIRONMENT.to_string(),
            cache_ttl: None,
            user_agent: None,
            polling_interval: None,
            load_timeout: None,
            enable_key_mapping: None,
            disable_double_underscore_to_colon_mapping: None,
            disable_environment_aliases: false,
        }
    }
}

impl RepositoryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = Some(site_url.into());
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Use universal-auth client credentials.
    pub fn with_client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment_name = environment.into();
        self
    }

    pub fn with_polling_interval(mut self, millis: u64) -> Self {
        self.polling_interval = Some(millis);
        self
    }

    pub fn with_load_timeout(mut self, millis: i64) -> Self {
        self.load_timeout = Some(millis);
        self
    }

    pub fn with_cache_ttl(mut self, millis: u64) -> Self {
        self.cache_ttl = Some(millis);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_key_mapping(mut self, enabled: bool) -> Self {
        self.enable_key_mapping = Some(enabled);
        self
    }

    /// Whether `__` keys get `:` aliases. Enabled unless switched off by
    /// either option.
    pub fn key_mapping_enabled(&self) -> bool {
        if self.disable_double_underscore_to_colon_mapping == Some(true) {
            return false;
        }
        self.enable_key_mapping.unwrap_or(true)
    }
}

// Credentials stay out of logs.
impl std::fmt::Debug for RepositoryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryOptions")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("site_url", &self.site_url)
            .field("project_id", &self.project_id)
            .field("environment_name", &self.environment_name)
            .field("cache_ttl", &self.cache_ttl)
            .field("user_agent", &self.user_agent)
            .field("polling_interval", &self.polling_interval)
            .field("load_timeout", &self.load_timeout)
            .field("key_mapping", &self.key_mapping_enabled())
            .field("disable_environment_aliases", &self.disable_environment_aliases)
            .finish()
    }
}
