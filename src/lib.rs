//! Odyssey testnet reward fleet.
//!
//! Drives a list of accounts through the reward service's daily cycle:
//! check in, fill the transaction quota, claim milestones, open mystery boxes,
//! then cool down and repeat.

pub mod account;
pub mod admin;
pub mod config;
pub mod fleet;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod service;

pub use config::FleetConfig;
pub use fleet::{Fleet, FleetError};
pub use lifecycle::Shutdown;
