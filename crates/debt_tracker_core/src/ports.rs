//! crates/debt_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or
//! notification channels.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    Category, CategoryTotal, Debt, DebtType, Expense, ExpenseFilter, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A conditional write found a different version than the one it expected.
    #[error("Write conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for debts, including the bulk transitions the sweeps rely on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DebtStore: Send + Sync {
    async fn create_debt(&self, debt: &Debt) -> PortResult<()>;

    /// Overwrites the mutable fields of `debt` if the stored version still equals
    /// `expected_version`, returning the stored row with its new version.
    async fn update_debt(&self, debt: &Debt, expected_version: i64) -> PortResult<Debt>;

    async fn get_debt_by_id(&self, id: Uuid) -> PortResult<Debt>;

    /// All debts of a user, earliest due date first.
    async fn list_debts_by_user(&self, user_id: Uuid) -> PortResult<Vec<Debt>>;

    /// Pending debts due between `today` and `until`, both inclusive.
    async fn list_upcoming_debts(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        until: NaiveDate,
    ) -> PortResult<Vec<Debt>>;

    /// Flips the debt to paid and stamps `sent_at = paid_at`, conditional on `expected_version`.
    async fn mark_debt_paid(
        &self,
        id: Uuid,
        expected_version: i64,
        paid_at: DateTime<Utc>,
    ) -> PortResult<Debt>;

    /// Moves every pending debt due before `today` to overdue and returns how many moved.
    async fn set_overdue(&self, today: NaiveDate) -> PortResult<u64>;

    /// Pending, reminder-enabled debts inside the cadence window that have not
    /// been reminded yet today. See [`crate::sweeps::is_due_for_reminder`].
    async fn get_debts_due_for_reminder(&self, today: NaiveDate) -> PortResult<Vec<Debt>>;

    async fn record_reminder(
        &self,
        id: Uuid,
        remind_at: DateTime<Utc>,
        sent_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Sum of amounts for debts of `debt_type` due inside the inclusive window.
    async fn sum_debts_in_range_by_type(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        debt_type: DebtType,
    ) -> PortResult<f64>;
}

/// Read-only expense aggregates used by the weekly report.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseReportStore: Send + Sync {
    async fn sum_expenses_in_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<f64>;

    /// Per-category totals, largest first, with uncategorized spending folded
    /// into [`crate::domain::UNCATEGORIZED`].
    async fn category_breakdown_in_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<CategoryTotal>>;
}

/// Persistence for individual expenses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Fails with `Conflict` when the id is already taken.
    async fn create_expense(&self, expense: &Expense) -> PortResult<()>;

    async fn get_expense_by_id(&self, id: Uuid) -> PortResult<Expense>;

    /// Matching expenses, most recent `expense_date` first.
    async fn list_expenses(&self, filter: &ExpenseFilter) -> PortResult<Vec<Expense>>;

    /// Overwrites amount, category, note and date of the stored expense.
    async fn update_expense(&self, expense: &Expense) -> PortResult<Expense>;

    async fn delete_expense(&self, id: Uuid) -> PortResult<()>;
}

/// Persistence for spending categories.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn create_category(&self, category: &Category) -> PortResult<()>;

    async fn get_category_by_id(&self, id: Uuid) -> PortResult<Category>;

    /// Global categories plus those owned by `user_id`, ordered by name.
    async fn list_categories(&self, user_id: Uuid) -> PortResult<Vec<Category>>;

    async fn rename_category(&self, id: Uuid, name: &str) -> PortResult<Category>;

    /// Removes the category. Expenses filed under it become uncategorized.
    async fn delete_category(&self, id: Uuid) -> PortResult<()>;
}

/// Delivers a reminder for a debt. Receivers must tolerate duplicates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn notify(&self, debt: &Debt) -> PortResult<()>;
}

/// Users and their browser login sessions.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str)
        -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a live session to its user. Expired or unknown sessions are `Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str, now: DateTime<Utc>)
        -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}
