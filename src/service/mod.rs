//! Reward service subsystem.
//!
//! # Data Flow
//! ```text
//! AccountSession
//!     → client.rs (RewardApi: one method per endpoint)
//!     → request.rs (RequestWrapper: headers, proxy, status handling)
//!     → remote API (JSON, `code: 0` = success)
//! ```
//!
//! # Design Decisions
//! - Composition: the client owns a request wrapper; the ledger is a separate object
//! - "Already done" answers are successes, so outer retries cannot loop on them

pub mod client;
pub mod request;
pub mod types;

pub use client::{HttpRewardClient, RewardApi};
pub use request::RequestWrapper;
pub use types::{
    AuthorizeRequest, ClaimOutcome, DailyTransactionState, RewardInfo, ServiceError,
    ServiceResult, DAILY_TRANSACTION_TARGET,
};
