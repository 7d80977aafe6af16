//! Daily cycle state machine for one account.
//!
//! # Cycle
//! ```text
//! Connect → Authenticate → CheckBalance → CheckIn → FillQuota
//!     → ClaimMilestones → DrainMysteryBoxes → CoolDown → Connect
//! ```
//!
//! Any failure aborts the cycle, waits `retry_delay`, and restarts at `Connect`.
//! The outer retry is unbounded. Every pause races the shutdown signal, and the
//! long ones (retry, cool-down) re-publish the time remaining once per second.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::account::error::{CycleError, CycleResult};
use crate::account::milestone::eligible_stages;
use crate::account::session::AccountSession;
use crate::config::SchedulerConfig;
use crate::ledger::types::{lamports_to_sol, sol_to_lamports};
use crate::lifecycle::ShutdownSignal;
use crate::observability::{metrics, Notice, StatusSink};
use crate::resilience::delay::{random_delay, trim_diagnostic};
use crate::service::ClaimOutcome;

/// How often a long pause re-publishes its remaining delay.
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// State machine step, as reported to the status sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    Authenticate,
    CheckBalance,
    CheckIn,
    FillQuota,
    ClaimMilestones,
    DrainMysteryBoxes,
    CoolDown,
    Retry,
    Stopped,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Connect => "connect",
            Phase::Authenticate => "authenticate",
            Phase::CheckBalance => "check_balance",
            Phase::CheckIn => "check_in",
            Phase::FillQuota => "fill_quota",
            Phase::ClaimMilestones => "claim_milestones",
            Phase::DrainMysteryBoxes => "drain_mystery_boxes",
            Phase::CoolDown => "cool_down",
            Phase::Retry => "retry",
            Phase::Stopped => "stopped",
        }
    }
}

/// Delays and gates applied by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    pub retry_delay: Duration,
    pub cool_down: Duration,
    pub min_balance_lamports: u64,
    pub quota_delay_min_ms: u64,
    pub quota_delay_max_ms: u64,
    pub step_delay: Duration,
    pub box_error_delay: Duration,
    pub stop_on_invalid_credential: bool,
}

impl Pacing {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            cool_down: Duration::from_secs(config.cool_down_secs),
            min_balance_lamports: sol_to_lamports(config.min_balance_sol),
            quota_delay_min_ms: config.quota_delay_min_ms,
            quota_delay_max_ms: config.quota_delay_max_ms,
            step_delay: Duration::from_millis(config.step_delay_ms),
            box_error_delay: Duration::from_millis(config.box_error_delay_ms),
            stop_on_invalid_credential: config.stop_on_invalid_credential,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }
}

/// How long `run` keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Cycle until shutdown.
    Forever,
    /// Return after the first successful cycle and its cool-down.
    SingleCycle,
}

/// Why `run` returned.
#[derive(Debug)]
pub enum OrchestratorExit {
    Shutdown,
    CycleDone,
    Terminal(CycleError),
}

/// Drives one [`AccountSession`] through the daily cycle.
pub struct AccountOrchestrator {
    session: AccountSession,
    pacing: Pacing,
    sink: Arc<dyn StatusSink>,
}

impl AccountOrchestrator {
    pub fn new(session: AccountSession, pacing: Pacing, sink: Arc<dyn StatusSink>) -> Self {
        Self { session, pacing, sink }
    }

    pub fn ordinal(&self) -> usize {
        self.session.ordinal()
    }

    /// Run cycles until shutdown, a terminal error, or (in `SingleCycle`) one success.
    pub async fn run(&mut self, mode: RunMode, mut shutdown: ShutdownSignal) -> OrchestratorExit {
        loop {
            let result = tokio::select! {
                _ = shutdown.cancelled() => return OrchestratorExit::Shutdown,
                result = self.run_cycle() => result,
            };

            match result {
                Ok(()) => {
                    metrics::record_cycle_completed();
                    let cool_down = self.pacing.cool_down;
                    if self.countdown(&mut shutdown, Phase::CoolDown, "Cycle complete, cooling down", cool_down).await {
                        return OrchestratorExit::Shutdown;
                    }
                    if mode == RunMode::SingleCycle {
                        return OrchestratorExit::CycleDone;
                    }
                }
                Err(e) if e.is_terminal() && self.pacing.stop_on_invalid_credential => {
                    metrics::record_cycle_failure(e.kind());
                    tracing::error!(account = self.ordinal(), error = %e, "Account stopped");
                    self.publish(Phase::Stopped, e.to_string());
                    self.sink.notice(Notice::Error(format!("Account {} stopped: {}", self.ordinal(), e)));
                    return OrchestratorExit::Terminal(e);
                }
                Err(e) => {
                    metrics::record_cycle_failure(e.kind());
                    let diagnostic = trim_diagnostic(&e.to_string());
                    tracing::warn!(account = self.ordinal(), error = %diagnostic, "Cycle failed, retrying");
                    let message = format!("Error: {}", diagnostic);
                    if self.countdown(&mut shutdown, Phase::Retry, message, self.pacing.retry_delay).await {
                        return OrchestratorExit::Shutdown;
                    }
                }
            }
        }
    }

    /// One pass from `Connect` through `DrainMysteryBoxes`.
    pub async fn run_cycle(&mut self) -> CycleResult<()> {
        self.publish(Phase::Connect, "Connecting wallet");
        let address = self.session.connect()?;
        self.publish(Phase::Connect, format!("Connected {}", address));

        self.session.authenticate().await?;
        self.session.refresh_rewards().await?;
        self.session.refresh_daily().await?;
        self.step(Phase::Authenticate, "Authenticated").await;

        self.check_balance().await?;

        match self.session.check_in().await? {
            Some(signature) => {
                // The check-in transaction counts toward the daily total.
                self.session.refresh_daily().await?;
                let link = self.session.link(&signature);
                self.step(Phase::CheckIn, format!("Checked in: {}", link)).await;
            }
            None => self.publish(Phase::CheckIn, "Already checked in today"),
        }

        self.fill_quota().await?;
        self.claim_milestones().await?;
        self.drain_mystery_boxes().await?;
        Ok(())
    }

    async fn check_balance(&mut self) -> CycleResult<()> {
        let lamports = self.session.refresh_balance().await?;
        if lamports < self.pacing.min_balance_lamports {
            return Err(CycleError::InsufficientFunds {
                balance: lamports_to_sol(lamports),
                required: lamports_to_sol(self.pacing.min_balance_lamports),
            });
        }
        self.publish(Phase::CheckBalance, format!("Balance {} SOL", lamports_to_sol(lamports)));
        Ok(())
    }

    async fn fill_quota(&mut self) -> CycleResult<()> {
        let mut state = self.session.refresh_daily().await?;

        let mut sent = 0u32;
        while !state.is_complete() {
            if sent > 0 {
                let delay = random_delay(self.pacing.quota_delay_min_ms, self.pacing.quota_delay_max_ms);
                self.publish_delayed(Phase::FillQuota, "Waiting before next transfer", delay);
                sleep(delay).await;
            }

            let (signature, destination) = self.session.send_transfer().await?;
            sent += 1;
            self.session.refresh_balance().await?;
            state = self.session.refresh_daily().await?;

            let link = self.session.link(&signature);
            self.publish(
                Phase::FillQuota,
                format!("Transfer {}/{} to {}: {}", state.completed, state.threshold, destination, link),
            );
        }

        self.publish(Phase::FillQuota, format!("Daily transactions complete ({} sent)", sent));
        Ok(())
    }

    async fn claim_milestones(&mut self) -> CycleResult<()> {
        let completed = self.session.daily().map(|d| d.completed).unwrap_or_default();

        for stage in eligible_stages(completed) {
            match self.session.claim_milestone(stage).await? {
                ClaimOutcome::Claimed => {
                    metrics::record_milestone(stage.number());
                    self.step(Phase::ClaimMilestones, format!("Claimed milestone {}", stage.number())).await;
                }
                ClaimOutcome::AlreadyClaimed => {
                    self.publish(
                        Phase::ClaimMilestones,
                        format!("Milestone {} already claimed", stage.number()),
                    );
                }
            }
        }
        Ok(())
    }

    async fn drain_mystery_boxes(&mut self) -> CycleResult<()> {
        let mut info = self.session.refresh_rewards().await?;

        while info.pending_boxes > 0 {
            self.publish(
                Phase::DrainMysteryBoxes,
                format!("Opening mystery box ({} pending)", info.pending_boxes),
            );

            match self.session.claim_mystery_box().await {
                Ok((signature, amount)) => {
                    metrics::record_mystery_box();
                    let link = self.session.link(&signature);
                    self.step(Phase::DrainMysteryBoxes, format!("Opened mystery box: {} RING ({})", amount, link))
                        .await;
                }
                Err(e) if e.is_custom_program_error() => {
                    tracing::warn!(account = self.ordinal(), error = %e, "Mystery box rejected by program");
                    self.publish_delayed(
                        Phase::DrainMysteryBoxes,
                        "Mystery box rejected, retrying",
                        self.pacing.box_error_delay,
                    );
                    sleep(self.pacing.box_error_delay).await;
                }
                Err(e) => return Err(e),
            }

            info = self.session.refresh_rewards().await?;
        }

        self.publish(Phase::DrainMysteryBoxes, "No mystery boxes pending");
        Ok(())
    }

    /// Publish and hold for the fixed step delay.
    async fn step(&self, phase: Phase, message: impl Into<String>) {
        self.publish_delayed(phase, message, self.pacing.step_delay);
        sleep(self.pacing.step_delay).await;
    }

    fn publish(&self, phase: Phase, message: impl Into<String>) {
        self.sink.publish(self.session.status(phase.as_str(), message));
    }

    fn publish_delayed(&self, phase: Phase, message: impl Into<String>, delay: Duration) {
        let mut update = self.session.status(phase.as_str(), message);
        update.delay = Some(delay);
        self.sink.publish(update);
    }

    /// Hold for `duration`, re-publishing the remaining delay every tick.
    /// Returns true if shutdown fired first.
    async fn countdown(
        &self,
        shutdown: &mut ShutdownSignal,
        phase: Phase,
        message: impl Into<String>,
        duration: Duration,
    ) -> bool {
        let message = message.into();
        let deadline = Instant::now() + duration;
        self.publish_delayed(phase, message.clone(), duration);

        let mut remaining = duration;
        while !remaining.is_zero() {
            tokio::select! {
                _ = shutdown.cancelled() => return true,
                _ = sleep(remaining.min(COUNTDOWN_TICK)) => {}
            }

            remaining = deadline.saturating_duration_since(Instant::now());
            if !remaining.is_zero() {
                let mut update = self.session.status(phase.as_str(), message.clone());
                update.delay = Some(remaining);
                update.countdown = true;
                self.sink.publish(update);
            }
        }
        false
    }
}

impl std::fmt::Debug for AccountOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountOrchestrator")
            .field("session", &self.session)
            .field("pacing", &self.pacing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use solana_sdk::hash::Hash;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::Signature;
    use solana_sdk::transaction::Transaction;

    use crate::account::Account;
    use crate::ledger::{ConfirmPolicy, Ledger, LedgerError, LedgerResult, TransactionExecutor, TxStatus};
    use crate::lifecycle::Shutdown;
    use crate::observability::StatusBoard;
    use crate::service::{
        AuthorizeRequest, DailyTransactionState, RewardApi, RewardInfo, ServiceError, ServiceResult,
    };

    struct OfflineLedger;

    #[async_trait]
    impl Ledger for OfflineLedger {
        async fn balance(&self, _: &Pubkey) -> LedgerResult<u64> {
            Err(LedgerError::Rpc("offline".into()))
        }
        async fn latest_blockhash(&self) -> LedgerResult<Hash> {
            Err(LedgerError::Rpc("offline".into()))
        }
        async fn send(&self, _: &Transaction) -> LedgerResult<Signature> {
            Err(LedgerError::Rpc("offline".into()))
        }
        async fn status(&self, _: &Signature) -> LedgerResult<TxStatus> {
            Ok(TxStatus::Unknown)
        }
    }

    struct OfflineService;

    #[async_trait]
    impl RewardApi for OfflineService {
        async fn get_challenge(&self, _: &str) -> ServiceResult<String> {
            Err(ServiceError::Transport("offline".into()))
        }
        async fn authorize(&self, _: &AuthorizeRequest) -> ServiceResult<String> {
            Err(ServiceError::Transport("offline".into()))
        }
        async fn get_daily_transaction_state(&self, _: &str) -> ServiceResult<DailyTransactionState> {
            Err(ServiceError::Transport("offline".into()))
        }
        async fn get_reward_info(&self, _: &str) -> ServiceResult<RewardInfo> {
            Err(ServiceError::Transport("offline".into()))
        }
        async fn get_check_in_transaction(&self, _: &str) -> ServiceResult<Option<String>> {
            Err(ServiceError::Transport("offline".into()))
        }
        async fn post_check_in(&self, _: &str, _: &str) -> ServiceResult<()> {
            Err(ServiceError::Transport("offline".into()))
        }
        async fn claim_milestone(&self, _: &str, _: u8) -> ServiceResult<ClaimOutcome> {
            Err(ServiceError::Transport("offline".into()))
        }
        async fn build_mystery_box_transaction(&self, _: &str) -> ServiceResult<String> {
            Err(ServiceError::Transport("offline".into()))
        }
        async fn open_mystery_box(&self, _: &str, _: &str) -> ServiceResult<f64> {
            Err(ServiceError::Transport("offline".into()))
        }
    }

    fn orchestrator(credential: &str, pacing: Pacing, board: &StatusBoard) -> AccountOrchestrator {
        let executor = TransactionExecutor::new(Arc::new(OfflineLedger), ConfirmPolicy::default(), "");
        let session = AccountSession::new(
            Account::new(1, credential, None),
            Box::new(OfflineService),
            executor,
            Arc::from(Vec::<Pubkey>::new()),
            1,
        );
        AccountOrchestrator::new(session, pacing, Arc::new(board.clone()))
    }

    fn phase_of(board: &StatusBoard) -> &'static str {
        board.get(1).map(|s| s.update.phase).unwrap_or_default()
    }

    #[test]
    fn test_pacing_from_defaults() {
        let pacing = Pacing::default();
        assert_eq!(pacing.retry_delay, Duration::from_secs(10));
        assert_eq!(pacing.cool_down, Duration::from_secs(86_400));
        assert_eq!(pacing.min_balance_lamports, 10_000_000);
        assert!(pacing.stop_on_invalid_credential);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_credential_stops_account() {
        let board = StatusBoard::new();
        let mut orch = orchestrator("not-a-key!", Pacing::default(), &board);

        let exit = orch.run(RunMode::Forever, ShutdownSignal::never()).await;

        assert!(matches!(exit, OrchestratorExit::Terminal(ref e) if e.is_terminal()));
        assert_eq!(phase_of(&board), Phase::Stopped.as_str());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_credential_retries_when_not_stopping() {
        let board = StatusBoard::new();
        let pacing = Pacing {
            stop_on_invalid_credential: false,
            ..Pacing::default()
        };
        let mut orch = orchestrator("not-a-key!", pacing, &board);
        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();

        let handle = tokio::spawn(async move { orch.run(RunMode::Forever, signal).await });
        sleep(Duration::from_secs(35)).await;
        assert_eq!(phase_of(&board), Phase::Retry.as_str());

        shutdown.trigger();
        assert!(matches!(handle.await.unwrap(), OrchestratorExit::Shutdown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_reports_retry_with_delay() {
        let board = StatusBoard::new();
        let key = bs58::encode(solana_sdk::signature::Keypair::new().to_bytes()).into_string();
        let mut orch = orchestrator(&key, Pacing::default(), &board);

        let err = orch.run_cycle().await.unwrap_err();
        assert_eq!(err.kind(), "service");

        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        let handle = tokio::spawn(async move { orch.run(RunMode::Forever, signal).await });
        sleep(Duration::from_millis(10)).await;

        let status = board.get(1).unwrap();
        assert_eq!(status.update.phase, "retry");
        assert_eq!(status.delay_secs, Some(10));
        assert!(status.update.address.is_some());

        shutdown.trigger();
        assert!(matches!(handle.await.unwrap(), OrchestratorExit::Shutdown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_delay_counts_down() {
        let board = StatusBoard::new();
        let key = bs58::encode(solana_sdk::signature::Keypair::new().to_bytes()).into_string();
        let mut orch = orchestrator(&key, Pacing::default(), &board);

        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        let handle = tokio::spawn(async move { orch.run(RunMode::Forever, signal).await });

        sleep(Duration::from_millis(10)).await;
        assert_eq!(board.get(1).unwrap().delay_secs, Some(10));

        sleep(Duration::from_secs(4)).await;
        let status = board.get(1).unwrap();
        assert_eq!(status.update.phase, "retry");
        assert_eq!(status.delay_secs, Some(6));

        shutdown.trigger();
        assert!(matches!(handle.await.unwrap(), OrchestratorExit::Shutdown));
    }

    #[test]
    fn test_phase_labels_are_unique() {
        let phases = [
            Phase::Connect,
            Phase::Authenticate,
            Phase::CheckBalance,
            Phase::CheckIn,
            Phase::FillQuota,
            Phase::ClaimMilestones,
            Phase::DrainMysteryBoxes,
            Phase::CoolDown,
            Phase::Retry,
            Phase::Stopped,
        ];
        let labels: std::collections::HashSet<_> = phases.iter().map(|p| p.as_str()).collect();
        assert_eq!(labels.len(), phases.len());
    }
}
