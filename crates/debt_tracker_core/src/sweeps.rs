//! crates/debt_tracker_core/src/sweeps.rs
//!
//! Time-driven batch operations over all debts. Neither sweep keeps state in
//! memory; both are safe to invoke repeatedly and from several workers, since
//! their selection predicates read only persisted fields.

use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::{utc_today, Debt, DebtStatus};
use crate::error::DebtResult;
use crate::ports::{DebtStore, ReminderNotifier};

/// Days before the due date on which a reminder fires.
pub const REMINDER_OFFSETS: [i64; 3] = [3, 1, 0];

/// The reminder selection rule: pending, opted in, inside the cadence window and
/// not yet reminded on `today`.
pub fn is_due_for_reminder(debt: &Debt, today: NaiveDate) -> bool {
    let offset = (debt.due_date - today).num_days();
    let reminded_today = debt
        .sent_at
        .map(|sent| sent.date_naive() >= today)
        .unwrap_or(false);

    debt.status == DebtStatus::Pending
        && debt.reminder_enabled
        && REMINDER_OFFSETS.contains(&offset)
        && !reminded_today
}

/// Runs the overdue and reminder sweeps. Scheduling is the caller's concern.
#[derive(Clone)]
pub struct SweepService {
    store: Arc<dyn DebtStore>,
    notifier: Arc<dyn ReminderNotifier>,
    clock: Arc<dyn Clock>,
}

impl SweepService {
    pub fn new(
        store: Arc<dyn DebtStore>,
        notifier: Arc<dyn ReminderNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// Flips every pending debt due before today to overdue.
    /// Returns how many debts moved on this run.
    pub async fn run_overdue_check(&self) -> DebtResult<u64> {
        let today = utc_today(self.clock.utc());
        let affected = self.store.set_overdue(today).await?;
        info!(%today, affected, "overdue sweep finished");
        Ok(affected)
    }

    /// Notifies and records every debt due for a reminder today.
    ///
    /// A debt whose notification fails is skipped and stays eligible for the next
    /// run. A failure to record the dispatch aborts the sweep; debts already
    /// notified on this run stay eligible too and will be notified again.
    pub async fn run_reminder_check(&self) -> DebtResult<Vec<Debt>> {
        let now = self.clock.utc();
        let today = utc_today(now);
        let candidates = self.store.get_debts_due_for_reminder(today).await?;

        let mut reminded = Vec::with_capacity(candidates.len());
        for mut debt in candidates {
            if let Err(e) = self.notifier.notify(&debt).await {
                warn!(debt_id = %debt.id, error = %e, "reminder notification failed; will retry next sweep");
                continue;
            }
            self.store.record_reminder(debt.id, now, now).await?;
            debt.remind_at = Some(now);
            debt.sent_at = Some(now);
            reminded.push(debt);
        }

        info!(%today, reminded = reminded.len(), "reminder sweep finished");
        Ok(reminded)
    }
}
