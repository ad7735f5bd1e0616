//! services/api/src/adapters/notifier.rs
//!
//! This module contains the reminder delivery adapter. It implements the
//! `ReminderNotifier` port by emitting a structured `tracing` event per reminder,
//! which a log shipper can forward to email or push delivery.

use async_trait::async_trait;
use debt_tracker_core::{
    domain::{Debt, DebtType},
    ports::{PortResult, ReminderNotifier},
};
use tracing::info;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ReminderNotifier` by logging each dispatch.
#[derive(Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a new `LogNotifier`.
    pub fn new() -> Self {
        Self
    }
}

/// Human-readable reminder line for a debt.
pub fn reminder_message(debt: &Debt) -> String {
    match debt.debt_type {
        DebtType::Lent => format!(
            "{} owes you {:.2}, due {}",
            debt.peer_name, debt.amount, debt.due_date
        ),
        DebtType::Borrowed => format!(
            "You owe {} {:.2}, due {}",
            debt.peer_name, debt.amount, debt.due_date
        ),
    }
}

//=========================================================================================
// `ReminderNotifier` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReminderNotifier for LogNotifier {
    async fn notify(&self, debt: &Debt) -> PortResult<()> {
        info!(
            target: "reminders",
            debt_id = %debt.id,
            user_id = %debt.user_id,
            due_date = %debt.due_date,
            "{}",
            reminder_message(debt)
        );
        Ok(())
    }
}
