//! Pacing delays and diagnostic helpers.

use std::time::Duration;

use rand::Rng;

/// Longest diagnostic kept in logs and status messages.
const MAX_DIAGNOSTIC_LEN: usize = 300;

/// Uniform random delay in `[min_ms, max_ms]`.
pub fn random_delay(min_ms: u64, max_ms: u64) -> Duration {
    if min_ms >= max_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}

/// Cut an error text down for logging: drop any HTML page and cap the length.
pub fn trim_diagnostic(text: &str) -> String {
    let lowered = text.to_ascii_lowercase();
    let cut = ["<!doctype html", "<html"]
        .iter()
        .filter_map(|marker| lowered.find(marker))
        .min()
        .unwrap_or(text.len());

    let kept = text[..cut].trim();
    if kept.chars().count() <= MAX_DIAGNOSTIC_LEN {
        return kept.to_string();
    }
    let mut short: String = kept.chars().take(MAX_DIAGNOSTIC_LEN).collect();
    short.push_str("...");
    short
}

/// Render a delay as `1h 2m 3s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64().round() as u64;
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}
