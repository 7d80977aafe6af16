//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Load accounts → Start fleet
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Every orchestrator drops its current step → Fleet returns
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Cancellation is cooperative; in-flight transactions are abandoned, not reverted

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
