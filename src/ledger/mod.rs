//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Private key (key file or environment)
//!     → wallet.rs (key decoding, challenge signing)
//!     → intent.rs (transfer building, service tx signing)
//!     → executor.rs (submit, confirm with bounded retry)
//!     → client.rs (RPC connection with timeouts)
//! ```
//!
//! # Security Constraints
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod executor;
pub mod intent;
pub mod types;
pub mod wallet;

pub use client::{Ledger, SolanaLedger};
pub use executor::{ConfirmPolicy, TransactionExecutor};
pub use intent::TransferIntent;
pub use types::{LedgerError, LedgerResult, TxStatus};
pub use wallet::{ChallengeSignature, Wallet};
