use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::observability::AccountStatus;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub accounts: usize,
    pub uptime_secs: u64,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        accounts: state.board.len(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub async fn get_accounts(State(state): State<AdminState>) -> Json<Vec<AccountStatus>> {
    Json(state.board.snapshot())
}

pub async fn get_account(
    State(state): State<AdminState>,
    Path(ordinal): Path<usize>,
) -> Result<Json<AccountStatus>, StatusCode> {
    state.board.get(ordinal).map(Json).ok_or(StatusCode::NOT_FOUND)
}
