//! Per-account session state and operations.
//!
//! # Responsibilities
//! - Hold the account's mutable snapshot (address, token, balance, quota, rewards)
//! - Expose each cycle step as one method over the ledger and reward clients
//!
//! # Design Decisions
//! - Owned by exactly one orchestrator; never shared, never locked
//! - Quota and reward numbers always come from the service, never local counting
//! - A 401 from the service drops the token so the next cycle re-authenticates

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::account::error::{CycleError, CycleResult};
use crate::account::milestone::MilestoneStage;
use crate::account::Account;
use crate::ledger::intent::{self, TransferIntent};
use crate::ledger::types::lamports_to_sol;
use crate::ledger::{TransactionExecutor, Wallet};
use crate::observability::StatusUpdate;
use crate::service::{
    AuthorizeRequest, ClaimOutcome, DailyTransactionState, RewardApi, RewardInfo, ServiceError,
    ServiceResult,
};

/// Mutable state and operations for one account.
pub struct AccountSession {
    account: Account,
    wallet: Option<Wallet>,
    token: Option<String>,
    balance: Option<u64>,
    daily: Option<DailyTransactionState>,
    reward: Option<RewardInfo>,
    executor: TransactionExecutor,
    service: Box<dyn RewardApi>,
    destinations: Arc<[Pubkey]>,
    transfer_lamports: u64,
}

impl AccountSession {
    pub fn new(
        account: Account,
        service: Box<dyn RewardApi>,
        executor: TransactionExecutor,
        destinations: Arc<[Pubkey]>,
        transfer_lamports: u64,
    ) -> Self {
        Self {
            account,
            wallet: None,
            token: None,
            balance: None,
            daily: None,
            reward: None,
            executor,
            service,
            destinations,
            transfer_lamports,
        }
    }

    /// 1-based position in the account list.
    pub fn ordinal(&self) -> usize {
        self.account.ordinal
    }

    pub fn address(&self) -> Option<Pubkey> {
        self.wallet.as_ref().map(Wallet::address)
    }

    pub fn daily(&self) -> Option<DailyTransactionState> {
        self.daily
    }

    /// Snapshot for the status sink.
    pub fn status(&self, phase: &'static str, message: impl Into<String>) -> StatusUpdate {
        StatusUpdate {
            ordinal: self.ordinal(),
            phase,
            message: message.into(),
            address: self.address().map(|a| a.to_string()),
            balance_sol: self.balance.map(lamports_to_sol),
            ring_balance: self.reward.map(|r| r.ring_balance),
            pending_boxes: self.reward.map(|r| r.pending_boxes),
            completed_transactions: self.daily.map(|d| d.completed),
            delay: None,
            countdown: false,
        }
    }

    /// Decode the credential and derive the address.
    pub fn connect(&mut self) -> CycleResult<Pubkey> {
        let wallet = Wallet::from_base58(self.account.credential())?;
        let address = wallet.address();
        self.wallet = Some(wallet);
        Ok(address)
    }

    fn wallet(&self) -> CycleResult<&Wallet> {
        self.wallet.as_ref().ok_or(CycleError::NotConnected)
    }

    fn token(&self) -> CycleResult<String> {
        self.token.clone().ok_or(CycleError::Service(ServiceError::MissingToken))
    }

    /// Drop the token when the service rejects it.
    fn guard<T>(&mut self, result: ServiceResult<T>) -> CycleResult<T> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                self.token = None;
            }
        }
        result.map_err(CycleError::from)
    }

    /// Challenge, sign, authorize. Stores the token.
    pub async fn authenticate(&mut self) -> CycleResult<()> {
        self.token = None;
        let address = self.wallet()?.address().to_string();

        let challenge = self.service.get_challenge(&address).await?;
        let signed = self.wallet()?.sign_challenge(challenge.as_bytes());
        let request = AuthorizeRequest {
            address: signed.address,
            address_encoded: signed.encoded_public_key,
            signature: signed.signature,
        };

        let token = self.service.authorize(&request).await?;
        self.token = Some(token);
        Ok(())
    }

    /// Fetch the balance in lamports.
    pub async fn refresh_balance(&mut self) -> CycleResult<u64> {
        let address = self.wallet()?.address();
        let lamports = self.executor.ledger().balance(&address).await?;
        self.balance = Some(lamports);
        Ok(lamports)
    }

    pub async fn refresh_daily(&mut self) -> CycleResult<DailyTransactionState> {
        let token = self.token()?;
        let result = self.service.get_daily_transaction_state(&token).await;
        let state = self.guard(result)?;
        self.daily = Some(state);
        Ok(state)
    }

    pub async fn refresh_rewards(&mut self) -> CycleResult<RewardInfo> {
        let token = self.token()?;
        let result = self.service.get_reward_info(&token).await;
        let info = self.guard(result)?;
        self.reward = Some(info);
        Ok(info)
    }

    /// Execute and report today's check-in. `None` if it was already done.
    pub async fn check_in(&mut self) -> CycleResult<Option<Signature>> {
        let token = self.token()?;
        let result = self.service.get_check_in_transaction(&token).await;
        let Some(blob) = self.guard(result)? else {
            return Ok(None);
        };

        let blockhash = self.executor.ledger().latest_blockhash().await?;
        let transaction = intent::sign_fresh(intent::decode_transaction(&blob)?, self.wallet()?.keypair(), blockhash)?;
        let signature = self.executor.send_and_confirm(&transaction).await?;

        let result = self.service.post_check_in(&token, &signature.to_string()).await;
        self.guard(result)?;
        Ok(Some(signature))
    }

    /// Send one transfer to a random pool destination (or to self).
    pub async fn send_transfer(&mut self) -> CycleResult<(Signature, Pubkey)> {
        let from = self.wallet()?.address();
        let transfer = TransferIntent::random(from, &self.destinations, self.transfer_lamports, &mut rand::thread_rng());
        let blockhash = self.executor.ledger().latest_blockhash().await?;
        let transaction = transfer.into_transaction(self.wallet()?.keypair(), blockhash);

        let signature = self.executor.send_and_confirm(&transaction).await?;
        Ok((signature, transfer.to))
    }

    pub async fn claim_milestone(&mut self, stage: MilestoneStage) -> CycleResult<ClaimOutcome> {
        let token = self.token()?;
        let result = self.service.claim_milestone(&token, stage.number()).await;
        self.guard(result)
    }

    /// Claim and open one mystery box. Returns the claim signature and amount won.
    pub async fn claim_mystery_box(&mut self) -> CycleResult<(Signature, f64)> {
        let token = self.token()?;
        let result = self.service.build_mystery_box_transaction(&token).await;
        let blob = self.guard(result)?;

        let transaction = intent::sign_partial(intent::decode_transaction(&blob)?, self.wallet()?.keypair())?;
        let signature = self.executor.send_and_confirm(&transaction).await?;

        let result = self.service.open_mystery_box(&token, &signature.to_string()).await;
        let amount = self.guard(result)?;
        Ok((signature, amount))
    }

    /// Explorer link for a transaction of this session.
    pub fn link(&self, signature: &Signature) -> String {
        self.executor.link(signature)
    }
}

impl std::fmt::Debug for AccountSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSession")
            .field("ordinal", &self.account.ordinal)
            .field("address", &self.address())
            .field("authenticated", &self.token.is_some())
            .field("balance", &self.balance)
            .field("daily", &self.daily)
            .field("reward", &self.reward)
            .finish()
    }
}
