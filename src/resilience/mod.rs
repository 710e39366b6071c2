//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Fetch of the secret set:
//!     → timeouts.rs (deadline on the whole load / refresh)
//!     → On transient failure: retries.rs (count attempts, back off)
//!     → backoff.rs (50ms + 5ms * 2^attempt)
//! ```
//!
//! # Design Decisions
//! - Every load has a deadline unless explicitly configured as unbounded
//! - Retries only for transient failures; rejected credentials abort at once

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::calculate_backoff;
pub use retries::RetryPolicy;
pub use timeouts::{with_deadline, DeadlineExceeded, LoadTimeout};
