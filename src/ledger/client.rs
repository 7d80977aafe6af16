//! Ledger RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint
//! - Query chain state (balances, blockhashes, signature statuses)
//! - Submit serialized signed transactions
//! - Handle timeouts and network errors gracefully

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tokio::time::timeout;

use crate::ledger::types::{LedgerConfig, LedgerError, LedgerResult, TxStatus};

/// The narrow ledger capability the fleet depends on.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Balance of `address` in lamports.
    async fn balance(&self, address: &Pubkey) -> LedgerResult<u64>;

    /// Blockhash to sign fresh transactions against.
    async fn latest_blockhash(&self) -> LedgerResult<Hash>;

    /// Submit a fully signed transaction. Transport failures map to `Submission`.
    async fn send(&self, transaction: &Transaction) -> LedgerResult<Signature>;

    /// Look up the finality of a submitted transaction.
    async fn status(&self, signature: &Signature) -> LedgerResult<TxStatus>;
}

/// Solana JSON-RPC implementation of [`Ledger`].
pub struct SolanaLedger {
    rpc: RpcClient,
    rpc_url: String,
    timeout_secs: u64,
}

impl SolanaLedger {
    /// Create a new client. No request is made until first use.
    pub fn new(config: &LedgerConfig) -> Self {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            Duration::from_secs(config.rpc_timeout_secs),
            CommitmentConfig::confirmed(),
        );

        tracing::info!(rpc_url = %config.rpc_url, "Ledger client initialized");

        Self {
            rpc,
            rpc_url: config.rpc_url.clone(),
            timeout_secs: config.rpc_timeout_secs,
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> LedgerResult<T>
    where
        F: Future<Output = LedgerResult<T>>,
    {
        timeout(Duration::from_secs(self.timeout_secs), fut)
            .await
            .map_err(|_| LedgerError::Timeout(self.timeout_secs))?
    }
}

#[async_trait]
impl Ledger for SolanaLedger {
    async fn balance(&self, address: &Pubkey) -> LedgerResult<u64> {
        self.with_timeout(async {
            self.rpc
                .get_balance(address)
                .await
                .map_err(|e| LedgerError::Rpc(e.to_string()))
        })
        .await
    }

    async fn latest_blockhash(&self) -> LedgerResult<Hash> {
        self.with_timeout(async {
            self.rpc
                .get_latest_blockhash()
                .await
                .map_err(|e| LedgerError::Rpc(e.to_string()))
        })
        .await
    }

    async fn send(&self, transaction: &Transaction) -> LedgerResult<Signature> {
        self.with_timeout(async {
            self.rpc
                .send_transaction(transaction)
                .await
                .map_err(|e| LedgerError::Submission(e.to_string()))
        })
        .await
    }

    async fn status(&self, signature: &Signature) -> LedgerResult<TxStatus> {
        let response = self
            .with_timeout(async {
                self.rpc
                    .get_signature_statuses(&[*signature])
                    .await
                    .map_err(|e| LedgerError::Rpc(e.to_string()))
            })
            .await?;

        let status = match response.value.into_iter().next().flatten() {
            None => TxStatus::Unknown,
            Some(status) => {
                if let Some(err) = &status.err {
                    TxStatus::Failed(err.to_string())
                } else if status.satisfies_commitment(CommitmentConfig::finalized()) {
                    TxStatus::Finalized
                } else {
                    TxStatus::Pending
                }
            }
        };
        Ok(status)
    }
}

impl std::fmt::Debug for SolanaLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaLedger")
            .field("rpc_url", &self.rpc_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
