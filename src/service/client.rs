//! Reward service client.
//!
//! # Responsibilities
//! - One method per endpoint, one HTTP round trip per call
//! - Downgrade "already done" answers to successful no-ops

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::ServiceConfig;
use crate::service::request::RequestWrapper;
use crate::service::types::{
    ApiResponse, AuthToken, AuthorizeRequest, ClaimOutcome, DailyTransactionState, OpenedBox,
    RewardInfo, ServiceResult, TransactionBlob,
};

/// The remote reward service, as seen by one account.
#[async_trait]
pub trait RewardApi: Send + Sync {
    /// Challenge text the account must sign.
    async fn get_challenge(&self, address: &str) -> ServiceResult<String>;

    /// Exchange a signed challenge for an auth token.
    async fn authorize(&self, request: &AuthorizeRequest) -> ServiceResult<String>;

    async fn get_daily_transaction_state(&self, token: &str) -> ServiceResult<DailyTransactionState>;

    async fn get_reward_info(&self, token: &str) -> ServiceResult<RewardInfo>;

    /// Check-in transaction to execute, or `None` when already checked in today.
    async fn get_check_in_transaction(&self, token: &str) -> ServiceResult<Option<String>>;

    /// Report the executed check-in transaction.
    async fn post_check_in(&self, token: &str, signature: &str) -> ServiceResult<()>;

    async fn claim_milestone(&self, token: &str, stage: u8) -> ServiceResult<ClaimOutcome>;

    /// Partially signed transaction claiming one mystery box.
    async fn build_mystery_box_transaction(&self, token: &str) -> ServiceResult<String>;

    /// Open the box claimed by `signature`; returns the amount won.
    async fn open_mystery_box(&self, token: &str, signature: &str) -> ServiceResult<f64>;
}

/// HTTP implementation of [`RewardApi`].
#[derive(Debug, Clone)]
pub struct HttpRewardClient {
    request: RequestWrapper,
}

impl HttpRewardClient {
    pub fn new(request: RequestWrapper) -> Self {
        Self { request }
    }

    /// Build a client for one account, optionally routed through `route`.
    pub fn from_config(config: &ServiceConfig, route: Option<&str>) -> ServiceResult<Self> {
        let request = RequestWrapper::new(
            &config.base_url,
            route,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::new(request))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> ServiceResult<ApiResponse<T>> {
        self.request
            .call::<T, serde_json::Value>(Method::GET, path, token, None)
            .await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &serde_json::Value,
    ) -> ServiceResult<ApiResponse<T>> {
        self.request.call(Method::POST, path, token, Some(body)).await
    }
}

#[async_trait]
impl RewardApi for HttpRewardClient {
    async fn get_challenge(&self, address: &str) -> ServiceResult<String> {
        self.get::<String>(&format!("/testnet-v1/auth/sonic/challenge?wallet={}", address), None)
            .await?
            .into_data()
    }

    async fn authorize(&self, request: &AuthorizeRequest) -> ServiceResult<String> {
        let body = json!(request);
        let token: AuthToken = self
            .post("/testnet-v1/auth/sonic/authorize", None, &body)
            .await?
            .into_data()?;
        Ok(token.token)
    }

    async fn get_daily_transaction_state(&self, token: &str) -> ServiceResult<DailyTransactionState> {
        self.get("/testnet-v1/user/transactions/state/daily", Some(token))
            .await?
            .into_data()
    }

    async fn get_reward_info(&self, token: &str) -> ServiceResult<RewardInfo> {
        self.get("/testnet-v1/user/rewards/info", Some(token))
            .await?
            .into_data()
    }

    async fn get_check_in_transaction(&self, token: &str) -> ServiceResult<Option<String>> {
        let result: ServiceResult<TransactionBlob> = self
            .get("/testnet-v1/user/check-in/transaction", Some(token))
            .await?
            .into_data();
        match result {
            Ok(blob) => Ok(Some(blob.hash)),
            Err(e) if e.is_already_done() => {
                tracing::debug!(error = %e, "Check-in already performed");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn post_check_in(&self, token: &str, signature: &str) -> ServiceResult<()> {
        let result = self
            .post::<serde_json::Value>("/testnet-v1/user/check-in", Some(token), &json!({ "hash": signature }))
            .await?
            .into_unit();
        match result {
            Err(e) if e.is_already_done() => Ok(()),
            other => other,
        }
    }

    async fn claim_milestone(&self, token: &str, stage: u8) -> ServiceResult<ClaimOutcome> {
        let result = self
            .post::<serde_json::Value>(
                "/testnet-v1/user/transactions/rewards/claim",
                Some(token),
                &json!({ "stage": stage }),
            )
            .await?
            .into_unit();
        match result {
            Ok(()) => Ok(ClaimOutcome::Claimed),
            Err(e) if e.is_already_done() => Ok(ClaimOutcome::AlreadyClaimed),
            Err(e) => Err(e),
        }
    }

    async fn build_mystery_box_transaction(&self, token: &str) -> ServiceResult<String> {
        let blob: TransactionBlob = self
            .get("/testnet-v1/user/rewards/mystery-box/build-tx", Some(token))
            .await?
            .into_data()?;
        Ok(blob.hash)
    }

    async fn open_mystery_box(&self, token: &str, signature: &str) -> ServiceResult<f64> {
        let opened: OpenedBox = self
            .post(
                "/testnet-v1/user/rewards/mystery-box/open",
                Some(token),
                &json!({ "hash": signature }),
            )
            .await?
            .into_data()?;
        Ok(opened.amount)
    }
}
