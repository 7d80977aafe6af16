//! Reward service payloads and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transactions per day that count toward rewards.
pub const DAILY_TRANSACTION_TARGET: u32 = 100;

/// Envelope every endpoint answers with. `code == 0` is success.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Success payload, or the domain error the service reported.
    pub fn into_data(self) -> ServiceResult<T> {
        if self.code != 0 {
            return Err(ServiceError::Api {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }
        self.data
            .ok_or_else(|| ServiceError::Decode("response has no data".to_string()))
    }

    /// Success with any (or no) payload, or the domain error.
    pub fn into_unit(self) -> ServiceResult<()> {
        if self.code != 0 {
            return Err(ServiceError::Api {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

/// Body of the authorize call.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizeRequest {
    pub address: String,
    pub address_encoded: String,
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

/// Service-built transaction, base64 bincode.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionBlob {
    pub hash: String,
}

/// Daily quota progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DailyTransactionState {
    #[serde(rename = "total_transactions", default)]
    pub completed: u32,
    #[serde(default = "default_threshold")]
    pub threshold: u32,
}

fn default_threshold() -> u32 {
    DAILY_TRANSACTION_TARGET
}

impl DailyTransactionState {
    pub fn remaining(&self) -> u32 {
        self.threshold.saturating_sub(self.completed)
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.threshold
    }
}

/// Reward balances.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RewardInfo {
    /// Unopened mystery boxes.
    #[serde(rename = "ring_monitor", default)]
    pub pending_boxes: u32,
    /// Accrued bonus token balance.
    #[serde(rename = "ring", default)]
    pub ring_balance: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OpenedBox {
    #[serde(default)]
    pub amount: f64,
}

/// Result of a milestone claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed,
    AlreadyClaimed,
}

/// Errors returned by the reward service client.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Domain-level failure reported in the response body.
    #[error("Service error {code}: {message}")]
    Api { code: i64, message: String },

    /// The token was rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Non-success HTTP status other than 400/401.
    #[error("Request failed: {status} {body}")]
    Http { status: u16, body: String },

    /// Connection, TLS or proxy failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Body was not the expected JSON.
    #[error("Decode error: {0}")]
    Decode(String),

    /// An authenticated call was made before authorizing.
    #[error("Not authenticated")]
    MissingToken,
}

impl ServiceError {
    /// Domain errors meaning the action was already performed.
    pub fn is_already_done(&self) -> bool {
        match self {
            ServiceError::Api { message, .. } => message.to_ascii_lowercase().contains("already"),
            _ => false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::Unauthorized | ServiceError::MissingToken)
    }
}

/// Result type for reward service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;
