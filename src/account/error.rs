//! Errors raised while driving one account through a cycle.

use thiserror::Error;

use crate::ledger::types::LedgerError;
use crate::service::types::ServiceError;

/// Any failure that aborts the current cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Balance below the configured gate.
    #[error("Insufficient funds: balance {balance} SOL, need at least {required} SOL")]
    InsufficientFunds { balance: f64, required: f64 },

    /// A step needing the wallet ran before `connect`.
    #[error("Wallet not connected")]
    NotConnected,
}

impl CycleError {
    /// Errors no amount of retrying can fix.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CycleError::Ledger(LedgerError::InvalidCredential(_)))
    }

    /// Program-level ledger failure that mystery box draining may skip.
    pub fn is_custom_program_error(&self) -> bool {
        match self {
            CycleError::Ledger(e) => e.is_custom_program_error(),
            _ => false,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::Ledger(LedgerError::InvalidCredential(_)) => "invalid_credential",
            CycleError::Ledger(LedgerError::Submission(_)) => "submission",
            CycleError::Ledger(LedgerError::ConfirmationTimeout { .. }) => "confirmation_timeout",
            CycleError::Ledger(_) => "ledger",
            CycleError::Service(_) => "service",
            CycleError::InsufficientFunds { .. } => "insufficient_funds",
            CycleError::NotConnected => "not_connected",
        }
    }
}

pub type CycleResult<T> = Result<T, CycleError>;
