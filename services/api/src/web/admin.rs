//! services/api/src/web/admin.rs
//!
//! Sweep triggers for external schedulers. Guarded by `require_admin`.

use crate::web::{errors::debt_error_response, rest::DebtResponse, state::AppState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct OverdueSweepResponse {
    pub affected: u64,
}

#[derive(Serialize, ToSchema)]
pub struct ReminderSweepResponse {
    pub reminded: usize,
    pub debts: Vec<DebtResponse>,
}

/// Move every pending debt past its due date to overdue.
#[utoipa::path(
    post,
    path = "/admin/sweeps/overdue",
    responses(
        (status = 200, description = "Sweep finished", body = OverdueSweepResponse),
        (status = 401, description = "Wrong admin token")
    )
)]
pub async fn overdue_sweep_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let affected = app_state
        .sweeps
        .run_overdue_check()
        .await
        .map_err(debt_error_response)?;
    info!("Overdue sweep triggered over HTTP moved {} debts.", affected);
    Ok(Json(OverdueSweepResponse { affected }))
}

/// Send today's reminders.
#[utoipa::path(
    post,
    path = "/admin/sweeps/reminders",
    responses(
        (status = 200, description = "Sweep finished", body = ReminderSweepResponse),
        (status = 401, description = "Wrong admin token")
    )
)]
pub async fn reminder_sweep_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let reminded = app_state
        .sweeps
        .run_reminder_check()
        .await
        .map_err(debt_error_response)?;
    Ok(Json(ReminderSweepResponse {
        reminded: reminded.len(),
        debts: reminded.into_iter().map(DebtResponse::from).collect(),
    }))
}
