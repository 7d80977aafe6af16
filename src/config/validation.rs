//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs, addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FleetConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;

use crate::config::schema::FleetConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &FleetConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = url::Url::parse(&config.service.base_url) {
        errors.push(ValidationError::new("service.base_url", format!("invalid URL: {}", e)));
    }
    if config.service.request_timeout_secs == 0 {
        errors.push(ValidationError::new("service.request_timeout_secs", "must be > 0"));
    }

    if let Err(e) = url::Url::parse(&config.ledger.rpc_url) {
        errors.push(ValidationError::new("ledger.rpc_url", format!("invalid URL: {}", e)));
    }
    if config.ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.rpc_timeout_secs", "must be > 0"));
    }
    if config.ledger.max_confirm_retry == 0 {
        errors.push(ValidationError::new("ledger.max_confirm_retry", "must be >= 1"));
    }
    if config.ledger.confirm_interval_ms == 0 {
        errors.push(ValidationError::new("ledger.confirm_interval_ms", "must be > 0"));
    }
    if config.ledger.confirm_attempt_timeout_ms == 0 {
        errors.push(ValidationError::new("ledger.confirm_attempt_timeout_ms", "must be > 0"));
    }

    if config.transfer.amount_sol.is_nan() || config.transfer.amount_sol <= 0.0 {
        errors.push(ValidationError::new("transfer.amount_sol", "must be > 0"));
    }
    for (i, dest) in config.transfer.destinations.iter().enumerate() {
        if Pubkey::from_str(dest.trim()).is_err() {
            errors.push(ValidationError::new(
                format!("transfer.destinations[{}]", i),
                format!("'{}' is not a valid address", dest),
            ));
        }
    }

    let scheduler = &config.scheduler;
    if scheduler.quota_delay_min_ms > scheduler.quota_delay_max_ms {
        errors.push(ValidationError::new(
            "scheduler.quota_delay_min_ms",
            format!(
                "{} exceeds quota_delay_max_ms {}",
                scheduler.quota_delay_min_ms, scheduler.quota_delay_max_ms
            ),
        ));
    }
    if scheduler.retry_delay_secs == 0 {
        errors.push(ValidationError::new("scheduler.retry_delay_secs", "must be > 0"));
    }
    if scheduler.min_balance_sol < 0.0 {
        errors.push(ValidationError::new("scheduler.min_balance_sol", "must not be negative"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }
    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            "must be \"pretty\" or \"json\"",
        ));
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::new("admin.api_key", "required when admin is enabled"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&FleetConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = FleetConfig::default();
        config.ledger.rpc_url = "not a url".into();
        config.ledger.max_confirm_retry = 0;
        config.ledger.confirm_attempt_timeout_ms = 0;
        config.scheduler.quota_delay_min_ms = 5000;
        config.transfer.destinations = vec!["nope".into()];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"ledger.rpc_url"));
        assert!(fields.contains(&"ledger.max_confirm_retry"));
        assert!(fields.contains(&"ledger.confirm_attempt_timeout_ms"));
        assert!(fields.contains(&"scheduler.quota_delay_min_ms"));
        assert!(fields.contains(&"transfer.destinations[0]"));
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let mut config = FleetConfig::default();
        config.observability.log_format = "xml".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "observability.log_format: must be \"pretty\" or \"json\"");
    }
}
