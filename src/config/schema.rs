//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the fleet.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the fleet.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FleetConfig {
    /// Remote reward service endpoint.
    pub service: ServiceConfig,

    /// Ledger RPC and confirmation settings.
    pub ledger: LedgerConfig,

    /// Where credentials and egress routes are read from.
    pub accounts: AccountsConfig,

    /// Quota-filling transfer settings.
    pub transfer: TransferConfig,

    /// Batching, delays and balance gate.
    pub scheduler: SchedulerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Reward service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://odyssey-api-beta.sonic.game".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Ledger integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Prefix for transaction links in logs. Empty disables links.
    pub explorer_url: String,

    /// Confirmation retries after the first failed check.
    pub max_confirm_retry: u32,

    /// Wait before the first confirmation check, in milliseconds.
    pub confirm_initial_delay_ms: u64,

    /// Wait between confirmation checks, in milliseconds.
    pub confirm_interval_ms: u64,

    /// Longest wait for finality per attempt, in milliseconds.
    pub confirm_attempt_timeout_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.testnet.sonic.game".to_string(),
            rpc_timeout_secs: 30,
            explorer_url: "https://explorer.sonic.game/tx/".to_string(),
            max_confirm_retry: 3,
            confirm_initial_delay_ms: 2000,
            confirm_interval_ms: 2000,
            confirm_attempt_timeout_ms: 30_000,
        }
    }
}

/// Credential and egress route sources.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// File with one base58 private key per line.
    pub keys_file: String,

    /// Optional file with one proxy URL per line, matched to keys by position.
    pub proxies_file: Option<String>,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            keys_file: "accounts.txt".to_string(),
            proxies_file: None,
        }
    }
}

/// Transfer settings for quota filling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Amount sent per transfer, in SOL.
    pub amount_sol: f64,

    /// Destination pool. Empty means each account sends to itself.
    pub destinations: Vec<String>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            amount_sol: 0.0001,
            destinations: Vec::new(),
        }
    }
}

/// Scheduling and pacing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Accounts per batch. 0 runs every account at once.
    pub batch_size: usize,

    /// Back-off before a failed cycle restarts, in seconds.
    pub retry_delay_secs: u64,

    /// Idle time after a completed cycle, in seconds.
    pub cool_down_secs: u64,

    /// Minimum balance (SOL) required to start a cycle.
    pub min_balance_sol: f64,

    /// Lower bound of the pause between quota transfers, in milliseconds.
    pub quota_delay_min_ms: u64,

    /// Upper bound of the pause between quota transfers, in milliseconds.
    pub quota_delay_max_ms: u64,

    /// Fixed pause after each service call, in milliseconds.
    pub step_delay_ms: u64,

    /// Pause after a skippable mystery box failure, in milliseconds.
    pub box_error_delay_ms: u64,

    /// Stop an account for good when its private key cannot be decoded.
    pub stop_on_invalid_credential: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: 0,
            retry_delay_secs: 10,
            cool_down_secs: 24 * 60 * 60,
            min_balance_sol: 0.01,
            quota_delay_min_ms: 1000,
            quota_delay_max_ms: 3000,
            step_delay_ms: 1000,
            box_error_delay_ms: 3000,
            stop_on_invalid_credential: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_cycle() {
        let config = FleetConfig::default();
        assert_eq!(config.scheduler.cool_down_secs, 86_400);
        assert_eq!(config.scheduler.retry_delay_secs, 10);
        assert_eq!(config.ledger.max_confirm_retry, 3);
        assert_eq!(config.ledger.confirm_attempt_timeout_ms, 30_000);
        assert_eq!(config.scheduler.batch_size, 0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: FleetConfig = toml::from_str(
            r#"
            [scheduler]
            batch_size = 5

            [transfer]
            destinations = ["11111111111111111111111111111111"]
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.batch_size, 5);
        assert_eq!(config.scheduler.quota_delay_max_ms, 3000);
        assert_eq!(config.transfer.destinations.len(), 1);
        assert_eq!(config.ledger.rpc_url, "https://api.testnet.sonic.game");
    }
}
