//! crates/debt_tracker_core/src/report.rs
//!
//! Composes expense and debt aggregates for one inclusive date window.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{DebtType, WeeklyReport};
use crate::error::{DebtError, DebtResult};
use crate::ports::{DebtStore, ExpenseReportStore};

#[derive(Clone)]
pub struct ReportService {
    expenses: Arc<dyn ExpenseReportStore>,
    debts: Arc<dyn DebtStore>,
}

impl ReportService {
    pub fn new(expenses: Arc<dyn ExpenseReportStore>, debts: Arc<dyn DebtStore>) -> Self {
        Self { expenses, debts }
    }

    /// Builds the report for `[start, end]`. Any failing aggregation fails the whole report.
    pub async fn get_weekly_report(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DebtResult<WeeklyReport> {
        if end < start {
            return Err(DebtError::InvalidDateRange);
        }

        let total_expense = self.expenses.sum_expenses_in_range(user_id, start, end).await?;
        let category_breakdown = self
            .expenses
            .category_breakdown_in_range(user_id, start, end)
            .await?;
        let total_lent = self
            .debts
            .sum_debts_in_range_by_type(user_id, start, end, DebtType::Lent)
            .await?;
        let total_borrowed = self
            .debts
            .sum_debts_in_range_by_type(user_id, start, end, DebtType::Borrowed)
            .await?;

        debug!(%user_id, %start, %end, total_expense, "weekly report computed");
        Ok(WeeklyReport {
            start_date: start,
            end_date: end,
            total_expense,
            total_lent,
            total_borrowed,
            category_breakdown,
        })
    }
}
