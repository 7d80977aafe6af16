//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrators produce:
//!     → status.rs (per-account snapshots for the admin API)
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log output (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Admin API (/admin/accounts)
//! ```
//!
//! # Design Decisions
//! - Status publishing never affects control flow
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod status;

pub use status::{AccountStatus, Notice, StatusBoard, StatusSink, StatusUpdate};
