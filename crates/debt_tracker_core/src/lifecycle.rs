//! crates/debt_tracker_core/src/lifecycle.rs
//!
//! Single-debt operations: create, update, mark-paid and the owner-facing reads.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use mockable::Clock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{utc_today, Debt, DebtDraft, DebtStatus, DebtType};
use crate::error::{DebtError, DebtResult};
use crate::ports::DebtStore;

/// Executes validated transitions on individual debts.
#[derive(Clone)]
pub struct DebtService {
    store: Arc<dyn DebtStore>,
    clock: Arc<dyn Clock>,
}

impl DebtService {
    pub fn new(store: Arc<dyn DebtStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Validates and persists a new debt. The status defaults to pending.
    pub async fn create(&self, draft: DebtDraft) -> DebtResult<Debt> {
        let now = self.clock.utc();
        let debt_type = validate_draft(&draft, utc_today(now))?;
        if draft.id.is_nil() {
            return Err(DebtError::MissingField("debt id"));
        }
        if draft.user_id.is_nil() {
            return Err(DebtError::MissingField("user id"));
        }

        let debt = Debt {
            id: draft.id,
            user_id: draft.user_id,
            debt_type,
            peer_name: draft.peer_name,
            amount: draft.amount,
            due_date: draft.due_date,
            reminder_enabled: draft.reminder_enabled,
            remind_at: None,
            sent_at: None,
            status: draft.status.unwrap_or(DebtStatus::Pending),
            note: draft.note,
            created_at: now,
            version: 1,
        };
        self.store.create_debt(&debt).await?;

        info!(debt_id = %debt.id, user_id = %debt.user_id, "debt created");
        Ok(debt)
    }

    /// Replaces the editable fields of an unpaid debt.
    ///
    /// Owner, status, creation time and reminder bookkeeping always come from the
    /// stored record; whatever the draft carries for them is ignored.
    pub async fn update(&self, draft: DebtDraft) -> DebtResult<Debt> {
        if draft.id.is_nil() {
            return Err(DebtError::MissingField("debt id"));
        }

        let existing = self.store.get_debt_by_id(draft.id).await?;
        if existing.status.is_terminal() {
            return Err(DebtError::AlreadyPaid);
        }
        let debt_type = validate_draft(&draft, utc_today(self.clock.utc()))?;

        let debt = Debt {
            id: existing.id,
            user_id: existing.user_id,
            debt_type,
            peer_name: draft.peer_name,
            amount: draft.amount,
            due_date: draft.due_date,
            reminder_enabled: draft.reminder_enabled,
            remind_at: existing.remind_at,
            sent_at: existing.sent_at,
            status: existing.status,
            note: draft.note,
            created_at: existing.created_at,
            version: existing.version,
        };
        let stored = self.store.update_debt(&debt, existing.version).await?;

        info!(debt_id = %stored.id, version = stored.version, "debt updated");
        Ok(stored)
    }

    /// Settles a pending or overdue debt. Calling it on a paid debt is an error.
    pub async fn mark_paid(&self, id: Uuid) -> DebtResult<Debt> {
        if id.is_nil() {
            return Err(DebtError::MissingField("debt id"));
        }

        let existing = self.store.get_debt_by_id(id).await?;
        if existing.status.is_terminal() {
            return Err(DebtError::AlreadyPaid);
        }

        let paid = self
            .store
            .mark_debt_paid(id, existing.version, self.clock.utc())
            .await?;

        info!(debt_id = %id, previous_status = %existing.status, "debt marked paid");
        Ok(paid)
    }

    pub async fn get(&self, id: Uuid) -> DebtResult<Debt> {
        if id.is_nil() {
            return Err(DebtError::MissingField("debt id"));
        }
        Ok(self.store.get_debt_by_id(id).await?)
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> DebtResult<Vec<Debt>> {
        if user_id.is_nil() {
            return Err(DebtError::MissingField("user id"));
        }
        Ok(self.store.list_debts_by_user(user_id).await?)
    }

    /// Pending debts falling due within the next `days` days, today included.
    pub async fn list_upcoming(&self, user_id: Uuid, days: i64) -> DebtResult<Vec<Debt>> {
        if user_id.is_nil() {
            return Err(DebtError::MissingField("user id"));
        }
        if days <= 0 {
            return Err(DebtError::InvalidDays);
        }
        let today = utc_today(self.clock.utc());
        // `days` is positive here, so the cast is lossless.
        let until = today
            .checked_add_days(Days::new(days as u64))
            .ok_or(DebtError::InvalidDays)?;
        debug!(%user_id, %today, %until, "listing upcoming debts");
        Ok(self.store.list_upcoming_debts(user_id, today, until).await?)
    }
}

/// Checks the editable fields shared by create and update.
///
/// The due date goes first: a debt dated in the past is rejected whatever else it carries.
fn validate_draft(draft: &DebtDraft, today: NaiveDate) -> DebtResult<DebtType> {
    if draft.due_date < today {
        return Err(DebtError::DueDateInPast);
    }
    let debt_type = draft.debt_type.ok_or(DebtError::MissingField("debt type"))?;
    if draft.peer_name.trim().is_empty() {
        return Err(DebtError::MissingField("peer name"));
    }
    if !(draft.amount.is_finite() && draft.amount > 0.0) {
        return Err(DebtError::InvalidAmount);
    }
    Ok(debt_type)
}
