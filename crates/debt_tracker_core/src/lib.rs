pub mod categories;
pub mod clock;
pub mod domain;
pub mod error;
pub mod expenses;
pub mod lifecycle;
pub mod memory;
pub mod ports;
pub mod report;
pub mod sweeps;

#[cfg(test)]
mod test_support;

pub use domain::{
    Category, CategoryTotal, Debt, DebtDraft, DebtStatus, DebtType, Expense, ExpenseDraft,
    ExpenseFilter, ExpensePatch, User, UserCredentials, WeeklyReport,
};
pub use categories::CategoryService;
pub use error::{DebtError, DebtResult};
pub use expenses::ExpenseService;
pub use lifecycle::DebtService;
pub use ports::{
    AccountStore, CategoryStore, DebtStore, ExpenseReportStore, ExpenseStore, PortError,
    PortResult, ReminderNotifier,
};
pub use report::ReportService;
pub use sweeps::SweepService;
