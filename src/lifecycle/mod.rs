//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (provider):
//!     Validate options → initial load (deadline) → start polling scheduler
//!
//! Shutdown (shutdown.rs):
//!     trigger → scheduler loop exits → in-flight refresh discarded → session closed
//! ```
//!
//! # Design Decisions
//! - Ordered startup: options first, then the initial load, then polling
//! - No refresh cycle starts after shutdown has been triggered

pub mod shutdown;

pub use shutdown::Shutdown;
