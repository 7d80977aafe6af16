//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Orchestrator step fails
//!     → delay.rs (trim diagnostic for logs)
//!     → fixed back-off, full cycle restart
//! Quota filling
//!     → delay.rs (randomized pause between transfers)
//! ```
//!
//! # Design Decisions
//! - Rate shaping is by explicit delays only; the service sends no backpressure signal
//! - Error bodies are trimmed before they reach logs or the status board

pub mod delay;
