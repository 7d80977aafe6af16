//! Fleet scheduler.
//!
//! # Responsibilities
//! - Pair credentials with egress routes by position
//! - Build one orchestrator per account before any work starts
//! - Run all accounts at once, or in contiguous batches admitted one after another
//!
//! # Design Decisions
//! - Start failures (no accounts, route mismatch, bad route) happen before any network call
//! - In batch mode each account runs one cycle plus cool-down, then the next batch goes
//! - Accounts stopped by a terminal error leave the roster

use std::str::FromStr;
use std::sync::Arc;

use futures_util::future::join_all;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::account::{Account, AccountOrchestrator, AccountSession, OrchestratorExit, Pacing, RunMode};
use crate::config::{AccountSources, FleetConfig, ServiceConfig};
use crate::ledger::types::sol_to_lamports;
use crate::ledger::{ConfirmPolicy, Ledger, TransactionExecutor};
use crate::lifecycle::ShutdownSignal;
use crate::observability::{metrics, Notice, StatusSink};
use crate::service::{HttpRewardClient, RewardApi, ServiceError, ServiceResult};

/// Fleet-level start failures. These are fatal.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("No accounts configured: add private keys to the key file or set ODYSSEY_PRIVATE_KEYS")]
    NoAccounts,

    #[error("Proxy count ({routes}) does not match account count ({accounts})")]
    ConfigMismatch { accounts: usize, routes: usize },

    #[error("Invalid proxy for account {ordinal}: {source}")]
    Route {
        ordinal: usize,
        #[source]
        source: ServiceError,
    },

    #[error("Invalid destination address '{0}'")]
    InvalidDestination(String),
}

/// Pair keys with routes by position. Routes must be absent or match the key count.
pub fn pair_accounts(sources: AccountSources) -> Result<Vec<Account>, FleetError> {
    let AccountSources { keys, routes } = sources;

    if keys.is_empty() {
        return Err(FleetError::NoAccounts);
    }
    if !routes.is_empty() && routes.len() != keys.len() {
        return Err(FleetError::ConfigMismatch {
            accounts: keys.len(),
            routes: routes.len(),
        });
    }

    let mut routes = routes.into_iter();
    Ok(keys
        .into_iter()
        .enumerate()
        .map(|(i, key)| Account::new(i + 1, key, routes.next()))
        .collect())
}

/// Builds the reward service client for one account.
pub trait RewardApiFactory: Send + Sync {
    fn create(&self, account: &Account) -> ServiceResult<Box<dyn RewardApi>>;
}

/// HTTP clients against the configured service, one per account route.
#[derive(Debug, Clone)]
pub struct HttpRewardApiFactory {
    config: ServiceConfig,
}

impl HttpRewardApiFactory {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }
}

impl RewardApiFactory for HttpRewardApiFactory {
    fn create(&self, account: &Account) -> ServiceResult<Box<dyn RewardApi>> {
        let client = HttpRewardClient::from_config(&self.config, account.route.as_deref())?;
        Ok(Box::new(client))
    }
}

/// Runs one orchestrator per account.
pub struct Fleet {
    config: FleetConfig,
    ledger: Arc<dyn Ledger>,
    sink: Arc<dyn StatusSink>,
    factory: Arc<dyn RewardApiFactory>,
}

impl Fleet {
    pub fn new(
        config: FleetConfig,
        ledger: Arc<dyn Ledger>,
        sink: Arc<dyn StatusSink>,
        factory: Arc<dyn RewardApiFactory>,
    ) -> Self {
        Self {
            config,
            ledger,
            sink,
            factory,
        }
    }

    /// Validate sources and build every orchestrator. No network calls are made.
    pub fn build(&self, sources: AccountSources) -> Result<Vec<AccountOrchestrator>, FleetError> {
        let accounts = pair_accounts(sources)?;
        let destinations = parse_destinations(&self.config.transfer.destinations)?;
        let pacing = Pacing::from_config(&self.config.scheduler);
        let policy = ConfirmPolicy::from_config(&self.config.ledger);
        let lamports = sol_to_lamports(self.config.transfer.amount_sol);

        accounts
            .into_iter()
            .map(|account| -> Result<AccountOrchestrator, FleetError> {
                let service = self
                    .factory
                    .create(&account)
                    .map_err(|source| FleetError::Route {
                        ordinal: account.ordinal,
                        source,
                    })?;
                let executor = TransactionExecutor::new(
                    Arc::clone(&self.ledger),
                    policy,
                    self.config.ledger.explorer_url.clone(),
                );
                let session = AccountSession::new(account, service, executor, Arc::clone(&destinations), lamports);
                Ok(AccountOrchestrator::new(session, pacing, Arc::clone(&self.sink)))
            })
            .collect()
    }

    /// Run the fleet until shutdown, or until every account has stopped.
    pub async fn run(&self, sources: AccountSources, shutdown: ShutdownSignal) -> Result<(), FleetError> {
        let orchestrators = self.build(sources)?;
        let total = orchestrators.len();
        let batch_size = self.config.scheduler.batch_size;

        if batch_size == 0 || batch_size >= total {
            self.sink.notice(Notice::Info(format!("Starting {} accounts", total)));
            run_batch(orchestrators, RunMode::Forever, &shutdown).await;
            return Ok(());
        }

        let mut batches = into_batches(orchestrators, batch_size);
        self.sink.notice(Notice::Info(format!(
            "Starting {} accounts in {} batches of up to {}",
            total,
            batches.len(),
            batch_size
        )));

        loop {
            for (index, slot) in batches.iter_mut().enumerate() {
                if shutdown.is_triggered() {
                    return Ok(());
                }
                if slot.is_empty() {
                    continue;
                }

                tracing::info!(batch = index + 1, accounts = slot.len(), "Batch starting");
                let batch = std::mem::take(slot);
                *slot = run_batch(batch, RunMode::SingleCycle, &shutdown).await;
                tracing::info!(batch = index + 1, "Batch finished");
            }

            if shutdown.is_triggered() {
                return Ok(());
            }
            if batches.iter().all(Vec::is_empty) {
                self.sink.notice(Notice::Error("Every account has stopped".to_string()));
                return Ok(());
            }
        }
    }
}

impl std::fmt::Debug for Fleet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fleet")
            .field("batch_size", &self.config.scheduler.batch_size)
            .finish()
    }
}

fn parse_destinations(raw: &[String]) -> Result<Arc<[Pubkey]>, FleetError> {
    raw.iter()
        .map(|s| Pubkey::from_str(s.trim()).map_err(|_| FleetError::InvalidDestination(s.clone())))
        .collect::<Result<Vec<_>, _>>()
        .map(Arc::from)
}

/// Contiguous slices of at most `size` orchestrators.
fn into_batches(orchestrators: Vec<AccountOrchestrator>, size: usize) -> Vec<Vec<AccountOrchestrator>> {
    let mut batches = Vec::new();
    let mut current = Vec::with_capacity(size);
    for orchestrator in orchestrators {
        current.push(orchestrator);
        if current.len() == size {
            batches.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Spawn one task per orchestrator and wait for all. Returns those still runnable.
async fn run_batch(
    batch: Vec<AccountOrchestrator>,
    mode: RunMode,
    shutdown: &ShutdownSignal,
) -> Vec<AccountOrchestrator> {
    let handles = batch.into_iter().map(|mut orchestrator| {
        let signal = shutdown.clone();
        tokio::spawn(async move {
            metrics::account_started();
            let exit = orchestrator.run(mode, signal).await;
            metrics::account_stopped();
            (orchestrator, exit)
        })
    });

    let mut survivors = Vec::new();
    for joined in join_all(handles).await {
        match joined {
            Ok((orchestrator, OrchestratorExit::Terminal(e))) => {
                tracing::warn!(account = orchestrator.ordinal(), error = %e, "Account removed from rotation");
            }
            Ok((orchestrator, exit)) => {
                tracing::debug!(account = orchestrator.ordinal(), exit = ?exit, "Account task finished");
                survivors.push(orchestrator);
            }
            Err(e) => tracing::error!(error = %e, "Account task failed"),
        }
    }
    survivors
}
