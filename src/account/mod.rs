//! Per-account automation.
//!
//! # Data Flow
//! ```text
//! Account (ordinal, credential, route)
//!     → session.rs (wallet, token, balances; one method per step)
//!     → orchestrator.rs (daily cycle state machine, retry and cool-down)
//!     → StatusSink (one update per transition)
//! ```
//!
//! # Design Decisions
//! - One orchestrator owns one session; nothing is shared between accounts
//! - Milestone eligibility is a pure function of the completed count

pub mod error;
pub mod milestone;
pub mod orchestrator;
pub mod session;

pub use error::{CycleError, CycleResult};
pub use milestone::{eligible_stages, MilestoneStage};
pub use orchestrator::{AccountOrchestrator, OrchestratorExit, Pacing, Phase, RunMode};
pub use session::AccountSession;

/// One configured account: its position, private key and optional egress route.
#[derive(Clone)]
pub struct Account {
    /// 1-based position in the credential list.
    pub ordinal: usize,
    credential: String,
    pub route: Option<String>,
}

impl Account {
    pub fn new(ordinal: usize, credential: impl Into<String>, route: Option<String>) -> Self {
        Self {
            ordinal,
            credential: credential.into(),
            route,
        }
    }

    /// Base58 private key.
    pub fn credential(&self) -> &str {
        &self.credential
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("ordinal", &self.ordinal)
            .field("credential", &"<redacted>")
            .field("routed", &self.route.is_some())
            .finish()
    }
}
