//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! repository + provider produce:
//!     → tracing events (fetch attempts, change reasons, soft failures)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Secret values never reach logs or metric labels
//! - Subscriber and exporter are installed by the host, not the library

pub mod logging;
pub mod metrics;
