//! services/api/src/scheduler.rs
//!
//! This module contains the optional in-process trigger for the sweeps.
//! The sweeps themselves are stateless; this loop only decides when to call them.

use debt_tracker_core::SweepService;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Runs one overdue sweep followed by one reminder sweep. Failures are logged
/// and left for the next tick to retry.
pub async fn run_sweeps_once(sweeps: &SweepService) {
    match sweeps.run_overdue_check().await {
        Ok(affected) => info!("Overdue sweep moved {} debts.", affected),
        Err(e) => error!("Overdue sweep failed: {:?}", e),
    }
    match sweeps.run_reminder_check().await {
        Ok(reminded) => info!("Reminder sweep notified {} debts.", reminded.len()),
        Err(e) => error!("Reminder sweep failed: {:?}", e),
    }
}

/// Spawns a task that runs both sweeps every `period` until `cancellation_token`
/// is cancelled. The first run happens immediately.
pub fn spawn_sweep_loop(
    sweeps: SweepService,
    period: Duration,
    cancellation_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Sweep loop started with a period of {:?}.", period);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Sweep loop cancelled.");
                    return;
                }
                _ = ticker.tick() => run_sweeps_once(&sweeps).await,
            }
        }
    })
}
