//! Per-account status board.
//!
//! # Responsibilities
//! - Receive structured status updates from orchestrators
//! - Keep the latest snapshot per account for the admin API
//! - Mirror every update into the log

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::Serialize;

use crate::resilience::delay::format_duration;

/// One status update from an orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusUpdate {
    /// 1-based account position, stable for the process lifetime.
    pub ordinal: usize,
    /// Current state machine step.
    pub phase: &'static str,
    pub message: String,
    pub address: Option<String>,
    pub balance_sol: Option<f64>,
    pub ring_balance: Option<f64>,
    pub pending_boxes: Option<u32>,
    pub completed_transactions: Option<u32>,
    /// Pause that starts with this update, if any.
    #[serde(skip)]
    pub delay: Option<Duration>,
    /// Repeat of an earlier update with less of its delay remaining.
    #[serde(skip)]
    pub countdown: bool,
}

/// Stored snapshot with its receive time.
#[derive(Debug, Clone, Serialize)]
pub struct AccountStatus {
    #[serde(flatten)]
    pub update: StatusUpdate,
    pub delay_secs: Option<u64>,
    /// Unix seconds.
    pub updated_at: u64,
}

/// Freeform fleet-level message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Observability collaborator fed by orchestrators.
pub trait StatusSink: Send + Sync {
    fn publish(&self, update: StatusUpdate);

    fn notice(&self, notice: Notice);
}

/// Default sink: latest snapshot per account plus log output.
#[derive(Clone, Default)]
pub struct StatusBoard {
    accounts: Arc<DashMap<usize, AccountStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ordinal: usize) -> Option<AccountStatus> {
        self.accounts.get(&ordinal).map(|r| r.value().clone())
    }

    /// All snapshots ordered by ordinal.
    pub fn snapshot(&self) -> Vec<AccountStatus> {
        let mut all: Vec<_> = self.accounts.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|s| s.update.ordinal);
        all
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl StatusSink for StatusBoard {
    fn publish(&self, update: StatusUpdate) {
        match update.delay {
            Some(delay) if update.countdown => tracing::trace!(
                account = update.ordinal,
                phase = update.phase,
                remaining = %format_duration(delay),
                "{}",
                update.message
            ),
            Some(delay) => tracing::info!(
                account = update.ordinal,
                phase = update.phase,
                delay = %format_duration(delay),
                "{}",
                update.message
            ),
            None => tracing::info!(account = update.ordinal, phase = update.phase, "{}", update.message),
        }

        let updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let status = AccountStatus {
            delay_secs: update.delay.map(|d| d.as_secs()),
            update,
            updated_at,
        };
        self.accounts.insert(status.update.ordinal, status);
    }

    fn notice(&self, notice: Notice) {
        match notice {
            Notice::Info(msg) => tracing::info!("{}", msg),
            Notice::Error(msg) => tracing::error!("{}", msg),
        }
    }
}
