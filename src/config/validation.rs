//! Configuration validation.
//!
//! # Responsibilities
//! - Reject missing credentials, project id and site URL
//! - Enforce https for every host except `localhost`
//! - Reduce the site URL to scheme, host and port
//! - Turn the environment name into the backend's environment slug
//!
//! # Design Decisions
//! - Validation is a pure function: `&RepositoryOptions -> Result<ValidatedOptions, ValidationError>`
//! - The first violated rule is reported; nothing is retried
//! - Runs once, when a repository is constructed

use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::schema::RepositoryOptions;
use crate::resilience::timeouts::LoadTimeout;

/// A rejected option block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ProjectId is not set.")]
    MissingProjectId,

    #[error("ClientId is not set.")]
    MissingClientId,

    #[error("ClientSecret is not set.")]
    MissingClientSecret,

    #[error("SiteUrl is not set.")]
    MissingSiteUrl,

    #[error("SiteUrl is not a valid URL")]
    InvalidSiteUrl,

    #[error("SiteUrl must use HTTPS scheme")]
    InsecureSiteUrl,

    #[error("EnvironmentName is not set.")]
    MissingEnvironment,

    #[error("PollingInterval must be greater than zero")]
    InvalidPollingInterval,
}

/// How the repository proves its identity to the backend.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Universal-auth login exchanging client id/secret for a token.
    ClientCredentials { client_id: String, client_secret: String },
    /// A token issued out of band, used as-is.
    AccessToken(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Credentials::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
        }
    }
}

/// Options that passed validation, in the form the rest of the crate uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOptions {
    pub credentials: Credentials,
    /// Scheme, host and port only, no trailing slash.
    pub site_url: String,
    pub project_id: String,
    pub environment_slug: String,
    pub cache_ttl: Option<Duration>,
    pub user_agent: Option<String>,
    pub polling_interval: Option<Duration>,
    pub load_timeout: LoadTimeout,
    pub key_mapping: bool,
}

/// Validate an option block.
pub fn validate_options(options: &RepositoryOptions) -> Result<ValidatedOptions, ValidationError> {
    let project_id = non_empty(&options.project_id).ok_or(ValidationError::MissingProjectId)?;

    let credentials = match non_empty(&options.access_token) {
        Some(token) => Credentials::AccessToken(token.to_string()),
        None => {
            let client_id = non_empty(&options.client_id).ok_or(ValidationError::MissingClientId)?;
            let client_secret =
                non_empty(&options.client_secret).ok_or(ValidationError::MissingClientSecret)?;
            Credentials::ClientCredentials {
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
            }
        }
    };

    let site_url = non_empty(&options.site_url).ok_or(ValidationError::MissingSiteUrl)?;
    let site_url = sanitize_site_url(site_url)?;

    if options.environment_name.trim().is_empty() {
        return Err(ValidationError::MissingEnvironment);
    }
    let environment_slug =
        environment_slug(&options.environment_name, !options.disable_environment_aliases);

    let polling_interval = match options.polling_interval {
        Some(0) => return Err(ValidationError::InvalidPollingInterval),
        Some(ms) => Some(Duration::from_millis(ms)),
        None => None,
    };

    Ok(ValidatedOptions {
        credentials,
        site_url,
        project_id: project_id.to_string(),
        environment_slug,
        cache_ttl: options.cache_ttl.filter(|ms| *ms > 0).map(Duration::from_millis),
        user_agent: non_empty(&options.user_agent).map(str::to_string),
        polling_interval,
        load_timeout: LoadTimeout::from_millis(options.load_timeout),
        key_mapping: options.key_mapping_enabled(),
    })
}

/// Parse the site URL and keep only scheme, host and port.
///
/// `https` is required unless the host is `localhost`, which may also use `http`.
pub fn sanitize_site_url(raw: &str) -> Result<String, ValidationError> {
    let url = Url::parse(raw.trim()).map_err(|_| ValidationError::InvalidSiteUrl)?;
    let host = url.host_str().ok_or(ValidationError::InvalidSiteUrl)?;

    let allowed = match url.scheme() {
        "https" => true,
        "http" => host.eq_ignore_ascii_case("localhost"),
        _ => false,
    };
    if !allowed {
        return Err(ValidationError::InsecureSiteUrl);
    }

    // `port()` is `None` for the scheme's default port.
    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Lower-case the environment name, optionally applying the conventional
/// short aliases.
pub fn environment_slug(name: &str, apply_aliases: bool) -> String {
    let slug = name.trim().to_lowercase();
    if !apply_aliases {
        return slug;
    }
    match slug.as_str() {
        "development" => "dev".to_string(),
        "production" => "prod".to_string(),
        _ => slug,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
