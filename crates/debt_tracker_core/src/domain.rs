//! crates/debt_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Bucket used for expenses that carry no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

//=========================================================================================
// Debt Enums
//=========================================================================================

/// Where a debt sits in its lifecycle. `Paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebtStatus {
    Pending,
    Overdue,
    Paid,
}

impl DebtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtStatus::Pending => "pending",
            DebtStatus::Overdue => "overdue",
            DebtStatus::Paid => "paid",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DebtStatus::Paid)
    }
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebtStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DebtStatus::Pending),
            "overdue" => Ok(DebtStatus::Overdue),
            "paid" => Ok(DebtStatus::Paid),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Direction of the money: did the user lend it or borrow it?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebtType {
    Lent,
    Borrowed,
}

impl DebtType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtType::Lent => "lent",
            DebtType::Borrowed => "borrowed",
        }
    }
}

impl fmt::Display for DebtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebtType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lent" => Ok(DebtType::Lent),
            "borrowed" => Ok(DebtType::Borrowed),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Returned when a stored or submitted string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant '{0}'")]
pub struct UnknownVariant(pub String);

//=========================================================================================
// Debt
//=========================================================================================

/// A single debt owned by one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Debt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub debt_type: DebtType,
    pub peer_name: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub reminder_enabled: bool,
    pub remind_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub status: DebtStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Bumped by the store on every write; conditional writes compare against it.
    pub version: i64,
}

/// Caller-supplied fields for creating or updating a debt.
///
/// Fields the caller may leave out are optional here so that validation can
/// report exactly which one is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct DebtDraft {
    pub id: Uuid,
    pub user_id: Uuid,
    pub debt_type: Option<DebtType>,
    pub peer_name: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub reminder_enabled: bool,
    pub status: Option<DebtStatus>,
    pub note: Option<String>,
}

//=========================================================================================
// Reporting
//=========================================================================================

/// Expense total for one category display name.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category_name: String,
    pub total: f64,
}

/// Aggregated view of a user's money flow over an inclusive date window.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_expense: f64,
    pub total_lent: f64,
    pub total_borrowed: f64,
    pub category_breakdown: Vec<CategoryTotal>,
}

//=========================================================================================
// Expenses and Categories
//=========================================================================================

/// A spending category. Global categories (`user_id == None`) are shared by
/// every user and read-only; the rest belong to exactly one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub user_id: Option<Uuid>,
}

impl Category {
    pub fn is_global(&self) -> bool {
        self.user_id.is_none()
    }

    /// Global categories are visible to everyone, private ones only to their owner.
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.user_id.map_or(true, |owner| owner == user_id)
    }
}

/// A single recorded spend.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
    pub expense_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new expense.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
    pub expense_date: NaiveDate,
}

/// Partial update of an expense. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    pub amount: Option<f64>,
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
    pub expense_date: Option<NaiveDate>,
}

/// Which of a user's expenses to list. Both dates are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseFilter {
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        expense.user_id == self.user_id
            && self.category_id.map_or(true, |c| expense.category_id == Some(c))
            && self.from_date.map_or(true, |from| expense.expense_date >= from)
            && self.to_date.map_or(true, |to| expense.expense_date <= to)
    }
}

//=========================================================================================
// Identity
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// The UTC calendar day `now` falls on.
pub fn utc_today(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}
