//! Option management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, [Infisical] section) or builder calls
//!     → loader.rs (parse & deserialize)
//!     → RepositoryOptions (raw)
//!     → validation.rs (credentials, URL scheme, environment slug)
//!     → ValidatedOptions (immutable, consumed by backend + repository + provider)
//! ```
//!
//! # Design Decisions
//! - Options are validated once, when the repository is built
//! - Validation failures are fatal and never retried
//! - Credentials are redacted from `Debug` output

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_options, parse_options, ConfigError};
pub use schema::{RepositoryOptions, BOOTSTRAP_SECTION, DEFAULT_ENVIRONMENT};
pub use validation::{validate_options, Credentials, ValidatedOptions, ValidationError};
