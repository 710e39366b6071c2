//! Repository error definitions.

use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ValidationError;

/// Errors that can occur while fetching secrets.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// Options were rejected at construction.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Credentials were rejected; retrying cannot help.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Every attempt failed with a transient error.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last_error: BackendError,
    },

    /// The repository was closed.
    #[error("Repository is closed")]
    Closed,
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RepositoryError::RetriesExhausted {
            attempts: 10,
            last_error: BackendError::Transport("connection reset".into()),
        };
        assert_eq!(
            err.to_string(),
            "Max retries exceeded after 10 attempts: Transport error: connection reset"
        );

        let err = RepositoryError::from(ValidationError::InsecureSiteUrl);
        assert_eq!(err.to_string(), "SiteUrl must use HTTPS scheme");
    }
}
