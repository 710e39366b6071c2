//! Option loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{RepositoryOptions, BOOTSTRAP_SECTION};
use crate::config::validation::{validate_options, ValidationError};

/// Error type for option loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("Section [{0}] not found")]
    MissingSection(&'static str),

    #[error("Validation failed: {0}")]
    Validation(#[source] ValidationError),
}

/// Load and validate the `[Infisical]` section of a TOML file.
pub fn load_options(path: &Path) -> Result<RepositoryOptions, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let options = parse_options(&content)?;

    validate_options(&options).map_err(ConfigError::Validation)?;

    Ok(options)
}

/// Parse the `[Infisical]` section without validating it.
///
/// Hosts that layer overrides (CLI flags, code) on top of the file validate
/// after merging.
pub fn parse_options(content: &str) -> Result<RepositoryOptions, ConfigError> {
    let mut document: toml::Table = toml::from_str(content).map_err(ConfigError::Parse)?;
    let section = document
        .remove(BOOTSTRAP_SECTION)
        .ok_or(ConfigError::MissingSection(BOOTSTRAP_SECTION))?;

    section.try_into().map_err(ConfigError::Parse)
}
