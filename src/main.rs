//! Odyssey testnet reward fleet.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml + key file (+ proxy file)
//!            │
//!            ▼
//!   ┌─────────────────┐      ┌──────────────────────────────────────┐
//!   │      fleet      │─────▶│ AccountOrchestrator (one task each)  │
//!   │ pairing/batches │      │  Connect → Authenticate → Balance    │
//!   └─────────────────┘      │  → CheckIn → FillQuota → Milestones  │
//!                            │  → MysteryBoxes → CoolDown           │
//!                            └───────┬───────────────────┬──────────┘
//!                                    │                   │
//!                                    ▼                   ▼
//!                            ┌──────────────┐    ┌───────────────┐
//!                            │   service    │    │    ledger     │
//!                            │ reward API   │    │ RPC, confirm  │
//!                            └──────────────┘    └───────────────┘
//!
//!   Cross-cutting: observability (logs, metrics, status board),
//!   lifecycle (signals, shutdown), admin (read-only status API)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use odyssey_fleet::config::loader::{self, CONFIG_PATH_ENV_VAR};
use odyssey_fleet::fleet::{Fleet, HttpRewardApiFactory};
use odyssey_fleet::ledger::SolanaLedger;
use odyssey_fleet::lifecycle::{signals, Shutdown};
use odyssey_fleet::observability::{logging, metrics, StatusBoard};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var(CONFIG_PATH_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));
    let config = loader::load_or_default(&config_path)?;

    logging::init(&config.observability);
    tracing::info!("odyssey-fleet v{} starting", env!("CARGO_PKG_VERSION"));
    if !config_path.exists() {
        tracing::warn!(path = %config_path.display(), "Config file not found, using defaults");
    }

    tracing::info!(
        service = %config.service.base_url,
        rpc = %config.ledger.rpc_url,
        batch_size = config.scheduler.batch_size,
        destinations = config.transfer.destinations.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let sources = loader::load_account_sources(&config)?;

    let shutdown = Arc::new(Shutdown::new());
    let signal_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        signals::wait_for_signal(&signal_shutdown).await;
    });

    let board = StatusBoard::new();

    if config.admin.enabled {
        let admin_config = config.admin.clone();
        let admin_board = board.clone();
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = odyssey_fleet::admin::serve(&admin_config, admin_board, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let ledger = Arc::new(SolanaLedger::new(&config.ledger));
    let factory = Arc::new(HttpRewardApiFactory::new(config.service.clone()));
    let fleet = Fleet::new(config, ledger, Arc::new(board), factory);

    if let Err(e) = fleet.run(sources, shutdown.subscribe()).await {
        tracing::error!(error = %e, "Fleet failed to start");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
