//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FleetConfig (validated, immutable)
//!
//! key file / ODYSSEY_PRIVATE_KEYS, proxy file
//!     → loader.rs (line lists)
//!     → AccountSources (handed to the fleet scheduler)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{AccountSources, ConfigError};
pub use schema::FleetConfig;
pub use schema::{
    AccountsConfig, AdminConfig, LedgerConfig, ObservabilityConfig, SchedulerConfig,
    ServiceConfig, TransferConfig,
};
