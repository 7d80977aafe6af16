//! Read-only admin API over the status board.
//!
//! Routes (all behind bearer auth):
//! - `GET /admin/status`
//! - `GET /admin/accounts`
//! - `GET /admin/accounts/{ordinal}`

pub mod auth;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::config::AdminConfig;
use crate::lifecycle::ShutdownSignal;
use crate::observability::StatusBoard;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub board: StatusBoard,
    pub api_key: Arc<str>,
    pub started_at: Instant,
}

impl AdminState {
    pub fn new(board: StatusBoard, api_key: &str) -> Self {
        Self {
            board,
            api_key: Arc::from(api_key),
            started_at: Instant::now(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/accounts", get(get_accounts))
        .route("/admin/accounts/{ordinal}", get(get_account))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve the admin API until shutdown.
pub async fn serve(
    config: &AdminConfig,
    board: StatusBoard,
    mut shutdown: ShutdownSignal,
) -> std::io::Result<()> {
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    let router = setup_admin_router(AdminState::new(board, &config.api_key));
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
