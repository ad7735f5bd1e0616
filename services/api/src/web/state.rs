//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use debt_tracker_core::ports::{
    AccountStore, CategoryStore, DebtStore, ExpenseReportStore, ExpenseStore, ReminderNotifier,
};
use debt_tracker_core::{CategoryService, DebtService, ExpenseService, ReportService, SweepService};
use mockable::Clock;
use std::sync::Arc;

//=========================================================================================
// Storage Adapters
//=========================================================================================

/// Every storage port the API needs, usually all backed by one adapter.
#[derive(Clone)]
pub struct Stores {
    pub debts: Arc<dyn DebtStore>,
    pub expenses: Arc<dyn ExpenseStore>,
    pub expense_reports: Arc<dyn ExpenseReportStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub accounts: Arc<dyn AccountStore>,
}

impl Stores {
    /// Uses a single adapter for every port.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: DebtStore + ExpenseStore + ExpenseReportStore + CategoryStore + AccountStore + 'static,
    {
        Self {
            debts: store.clone(),
            expenses: store.clone(),
            expense_reports: store.clone(),
            categories: store.clone(),
            accounts: store,
        }
    }
}

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub debts: DebtService,
    pub expenses: ExpenseService,
    pub categories: CategoryService,
    pub sweeps: SweepService,
    pub reports: ReportService,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the core services over the given storage and notification adapters.
    pub fn new(
        stores: Stores,
        notifier: Arc<dyn ReminderNotifier>,
        clock: Arc<dyn Clock>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            accounts: stores.accounts,
            debts: DebtService::new(stores.debts.clone(), clock.clone()),
            expenses: ExpenseService::new(
                stores.expenses,
                stores.categories.clone(),
                clock.clone(),
            ),
            categories: CategoryService::new(stores.categories),
            sweeps: SweepService::new(stores.debts.clone(), notifier, clock.clone()),
            reports: ReportService::new(stores.expense_reports, stores.debts),
            clock,
            config,
        }
    }
}
