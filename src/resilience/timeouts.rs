//! Deadline enforcement for loads.
//!
//! # Responsibilities
//! - Turn the `LoadTimeout` option into a deadline
//! - Wrap a fetch so the caller stops waiting at the deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the abandoned fetch future is dropped
//! - A negative option value means wait forever

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Deadline applied when `LoadTimeout` is not configured.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a load may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTimeout {
    Bounded(Duration),
    Unbounded,
}

impl LoadTimeout {
    /// Interpret the `LoadTimeout` option (milliseconds).
    pub fn from_millis(value: Option<i64>) -> Self {
        match value {
            None => LoadTimeout::Bounded(DEFAULT_LOAD_TIMEOUT),
            Some(ms) if ms < 0 => LoadTimeout::Unbounded,
            Some(ms) => LoadTimeout::Bounded(Duration::from_millis(ms as u64)),
        }
    }
}

impl Default for LoadTimeout {
    fn default() -> Self {
        LoadTimeout::Bounded(DEFAULT_LOAD_TIMEOUT)
    }
}

impl std::fmt::Display for LoadTimeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadTimeout::Bounded(d) => write!(f, "{:?}", d),
            LoadTimeout::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// The deadline passed before the wrapped future finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {0:?}")]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut` to completion or until the deadline, whichever comes first.
pub async fn with_deadline<F>(timeout: LoadTimeout, fut: F) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    match timeout {
        LoadTimeout::Unbounded => Ok(fut.await),
        LoadTimeout::Bounded(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| DeadlineExceeded(limit)),
    }
}
