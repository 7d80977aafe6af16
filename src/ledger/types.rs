//! Ledger-specific types and error definitions.

use thiserror::Error;

pub use crate::config::schema::LedgerConfig;

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Convert lamports to SOL for display and balance gates.
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Convert a SOL amount to lamports, rounding to the nearest lamport.
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Private key could not be decoded into a keypair.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction could not be submitted.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Transaction was not finalized within the retry budget.
    #[error("Transaction {signature} not confirmed after {attempts} checks")]
    ConfirmationTimeout { signature: String, attempts: u32 },

    /// Transaction executed but failed on-chain.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A service-built transaction blob could not be decoded or signed.
    #[error("Transaction decode error: {0}")]
    Decode(String),
}

impl LedgerError {
    /// Program-level failures reported by the ledger, e.g. `custom program error: 0x1`.
    pub fn is_custom_program_error(&self) -> bool {
        match self {
            LedgerError::Submission(msg) | LedgerError::TransactionFailed(msg) => {
                msg.contains("custom program error")
            }
            _ => false,
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Observed state of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Not yet visible to the queried node.
    Unknown,
    /// Seen but below finalized commitment.
    Pending,
    /// Finalized.
    Finalized,
    /// Executed with an error.
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lamport_conversion() {
        assert_eq!(sol_to_lamports(0.0001), 100_000);
        assert_eq!(sol_to_lamports(0.01), 10_000_000);
        assert!((lamports_to_sol(20_000_000) - 0.02).abs() < f64::EPSILON);
    }

    #[test]
    fn test_custom_program_error_detection() {
        let err = LedgerError::Submission(
            "RPC response error -32002: Transaction simulation failed: Error processing Instruction 0: custom program error: 0x1771".into(),
        );
        assert!(err.is_custom_program_error());

        let err = LedgerError::TransactionFailed("custom program error: 0x0".into());
        assert!(err.is_custom_program_error());

        let err = LedgerError::Rpc("custom program error".into());
        assert!(!err.is_custom_program_error());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::ConfirmationTimeout { signature: "abc".into(), attempts: 4 };
        assert_eq!(err.to_string(), "Transaction abc not confirmed after 4 checks");

        let err = LedgerError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");
    }
}
