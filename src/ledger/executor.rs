//! Transaction submission and confirmation monitoring.
//!
//! # Responsibilities
//! - Submit signed transactions (no retry; the caller decides)
//! - Poll finality per attempt until a deadline, with a bounded number of attempts
//! - Track consecutive confirmation failures for the owning session

use std::sync::Arc;
use std::time::Duration;

use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tokio::time::{sleep, Instant};

use crate::ledger::client::Ledger;
use crate::ledger::types::{LedgerConfig, LedgerError, LedgerResult, TxStatus};
use crate::observability::metrics;

/// Confirmation polling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmPolicy {
    /// Retries allowed after the first failed check.
    pub max_retry: u32,
    /// Wait before the first check.
    pub initial_delay: Duration,
    /// Wait between checks.
    pub interval: Duration,
    /// How long one attempt keeps checking before it counts as failed.
    pub attempt_timeout: Duration,
}

impl ConfirmPolicy {
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self {
            max_retry: config.max_confirm_retry,
            initial_delay: Duration::from_millis(config.confirm_initial_delay_ms),
            interval: Duration::from_millis(config.confirm_interval_ms),
            attempt_timeout: Duration::from_millis(config.confirm_attempt_timeout_ms),
        }
    }
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}

/// Submits transactions for one session and waits for finality.
pub struct TransactionExecutor {
    ledger: Arc<dyn Ledger>,
    policy: ConfirmPolicy,
    explorer_url: String,
    /// Consecutive expired attempts for the transaction being confirmed.
    failures: u32,
}

impl TransactionExecutor {
    pub fn new(ledger: Arc<dyn Ledger>, policy: ConfirmPolicy, explorer_url: impl Into<String>) -> Self {
        Self {
            ledger,
            policy,
            explorer_url: explorer_url.into(),
            failures: 0,
        }
    }

    /// Shared ledger handle, for balance and blockhash queries.
    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Consecutive expired attempts recorded so far. Zero between transactions.
    pub fn confirm_failures(&self) -> u32 {
        self.failures
    }

    /// Submit a signed transaction.
    pub async fn submit(&self, transaction: &Transaction) -> LedgerResult<Signature> {
        match self.ledger.send(transaction).await {
            Ok(signature) => {
                tracing::debug!(tx = %signature, "Transaction submitted");
                Ok(signature)
            }
            Err(e) => {
                metrics::record_transaction("submit", false);
                Err(match e {
                    LedgerError::Submission(_) => e,
                    other => LedgerError::Submission(other.to_string()),
                })
            }
        }
    }

    /// Wait until `signature` is finalized.
    ///
    /// Each attempt checks at `interval` until finality or `attempt_timeout`. An expired
    /// attempt is retried up to `max_retry` times. The failure counter is reset before
    /// returning, whatever the outcome.
    pub async fn confirm(&mut self, signature: &Signature) -> LedgerResult<()> {
        let result = self.poll_until_finalized(signature).await;
        self.failures = 0;
        result
    }

    async fn poll_until_finalized(&mut self, signature: &Signature) -> LedgerResult<()> {
        sleep(self.policy.initial_delay).await;

        loop {
            let Some(observed) = self.attempt(signature).await? else {
                return Ok(());
            };

            if self.failures >= self.policy.max_retry {
                tracing::warn!(
                    tx = %signature,
                    attempts = self.failures + 1,
                    "Transaction not confirmed, retries exhausted"
                );
                return Err(LedgerError::ConfirmationTimeout {
                    signature: signature.to_string(),
                    attempts: self.failures + 1,
                });
            }

            self.failures += 1;
            metrics::record_confirm_retry();
            tracing::info!(
                tx = %signature,
                attempt = self.failures,
                max_retry = self.policy.max_retry,
                observed = %observed,
                "Transaction not confirmed yet, retrying"
            );
        }
    }

    /// One attempt. `Ok(None)` once finalized, `Ok(Some(last status))` when the deadline passes.
    async fn attempt(&self, signature: &Signature) -> LedgerResult<Option<String>> {
        let deadline = Instant::now() + self.policy.attempt_timeout;

        loop {
            let observed = match self.ledger.status(signature).await {
                Ok(TxStatus::Finalized) => return Ok(None),
                Ok(TxStatus::Failed(reason)) => {
                    return Err(LedgerError::TransactionFailed(reason));
                }
                Ok(status) => format!("{:?}", status),
                Err(e) => e.to_string(),
            };

            let now = Instant::now();
            if now >= deadline {
                return Ok(Some(observed));
            }
            tracing::debug!(tx = %signature, observed = %observed, "Awaiting finality");
            sleep(self.policy.interval.min(deadline - now)).await;
        }
    }

    /// Submit and wait for finality.
    pub async fn send_and_confirm(&mut self, transaction: &Transaction) -> LedgerResult<Signature> {
        let signature = self.submit(transaction).await?;
        match self.confirm(&signature).await {
            Ok(()) => {
                metrics::record_transaction("confirm", true);
                tracing::info!(tx = %signature, link = %self.link(&signature), "Transaction confirmed");
                Ok(signature)
            }
            Err(e) => {
                metrics::record_transaction("confirm", false);
                Err(e)
            }
        }
    }

    /// Explorer link for `signature`, or the bare signature when no explorer is set.
    pub fn link(&self, signature: &Signature) -> String {
        if self.explorer_url.is_empty() {
            signature.to_string()
        } else {
            format!("{}{}", self.explorer_url, signature)
        }
    }
}

impl std::fmt::Debug for TransactionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionExecutor")
            .field("policy", &self.policy)
            .field("failures", &self.failures)
            .finish()
    }
}
