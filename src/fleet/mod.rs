//! Fleet scheduling.
//!
//! # Data Flow
//! ```text
//! AccountSources (keys, proxies)
//!     → scheduler.rs (pairing, orchestrator construction, batching)
//!     → one tokio task per AccountOrchestrator
//! ```

pub mod scheduler;

pub use scheduler::{pair_accounts, Fleet, FleetError, HttpRewardApiFactory, RewardApiFactory};
