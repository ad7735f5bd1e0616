//! crates/debt_tracker_core/src/memory.rs
//!
//! In-memory implementation of every storage port, for tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Category, CategoryTotal, Debt, DebtStatus, DebtType, Expense, ExpenseFilter, User,
    UserCredentials, UNCATEGORIZED,
};
use crate::ports::{
    AccountStore, CategoryStore, DebtStore, ExpenseReportStore, ExpenseStore, PortError,
    PortResult,
};
use crate::sweeps::is_due_for_reminder;

/// In-memory store backed by `RwLock`-guarded maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    debts: Arc<RwLock<HashMap<Uuid, Debt>>>,
    expenses: Arc<RwLock<HashMap<Uuid, Expense>>>,
    categories: Arc<RwLock<HashMap<Uuid, Category>>>,
    users: Arc<RwLock<HashMap<String, UserCredentials>>>,
    auth_sessions: Arc<RwLock<HashMap<String, (Uuid, DateTime<Utc>)>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a debt as-is, bypassing lifecycle validation. Used to seed fixtures
    /// in states that cannot be reached through `create`, such as already paid.
    pub async fn insert_debt(&self, debt: Debt) {
        self.debts.write().await.insert(debt.id, debt);
    }

    /// Stores a category as-is. The only way to seed global categories.
    pub async fn insert_category(&self, category: Category) {
        self.categories.write().await.insert(category.id, category);
    }

    /// Current stored copy of a debt, if any.
    pub async fn debt(&self, id: Uuid) -> Option<Debt> {
        self.debts.read().await.get(&id).cloned()
    }

    async fn user_expenses_in_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<Expense> {
        self.expenses
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id && e.expense_date >= start && e.expense_date <= end)
            .cloned()
            .collect()
    }
}

fn expense_not_found(id: Uuid) -> PortError {
    PortError::NotFound(format!("Expense {} not found", id))
}

fn category_not_found(id: Uuid) -> PortError {
    PortError::NotFound(format!("Category {} not found", id))
}

fn sorted_by_due_date(mut debts: Vec<Debt>) -> Vec<Debt> {
    debts.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.created_at.cmp(&b.created_at)));
    debts
}

fn check_version(stored: &Debt, expected_version: i64) -> PortResult<()> {
    if stored.version != expected_version {
        return Err(PortError::Conflict(format!(
            "Debt {} is at version {}, expected {}",
            stored.id, stored.version, expected_version
        )));
    }
    Ok(())
}

#[async_trait]
impl DebtStore for MemoryStore {
    async fn create_debt(&self, debt: &Debt) -> PortResult<()> {
        let mut debts = self.debts.write().await;
        if debts.contains_key(&debt.id) {
            return Err(PortError::Conflict(format!("Debt {} already exists", debt.id)));
        }
        debts.insert(debt.id, debt.clone());
        Ok(())
    }

    async fn update_debt(&self, debt: &Debt, expected_version: i64) -> PortResult<Debt> {
        let mut debts = self.debts.write().await;
        let stored = debts
            .get_mut(&debt.id)
            .ok_or_else(|| PortError::NotFound(format!("Debt {} not found", debt.id)))?;
        check_version(stored, expected_version)?;

        stored.debt_type = debt.debt_type;
        stored.peer_name = debt.peer_name.clone();
        stored.amount = debt.amount;
        stored.due_date = debt.due_date;
        stored.reminder_enabled = debt.reminder_enabled;
        stored.remind_at = debt.remind_at;
        stored.sent_at = debt.sent_at;
        stored.status = debt.status;
        stored.note = debt.note.clone();
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn get_debt_by_id(&self, id: Uuid) -> PortResult<Debt> {
        self.debts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Debt {} not found", id)))
    }

    async fn list_debts_by_user(&self, user_id: Uuid) -> PortResult<Vec<Debt>> {
        let debts = self.debts.read().await;
        let owned = debts.values().filter(|d| d.user_id == user_id).cloned().collect();
        Ok(sorted_by_due_date(owned))
    }

    async fn list_upcoming_debts(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        until: NaiveDate,
    ) -> PortResult<Vec<Debt>> {
        let debts = self.debts.read().await;
        let upcoming = debts
            .values()
            .filter(|d| {
                d.user_id == user_id
                    && d.status == DebtStatus::Pending
                    && d.due_date >= today
                    && d.due_date <= until
            })
            .cloned()
            .collect();
        Ok(sorted_by_due_date(upcoming))
    }

    async fn mark_debt_paid(
        &self,
        id: Uuid,
        expected_version: i64,
        paid_at: DateTime<Utc>,
    ) -> PortResult<Debt> {
        let mut debts = self.debts.write().await;
        let stored = debts
            .get_mut(&id)
            .ok_or_else(|| PortError::NotFound(format!("Debt {} not found", id)))?;
        check_version(stored, expected_version)?;

        stored.status = DebtStatus::Paid;
        stored.sent_at = Some(paid_at);
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn set_overdue(&self, today: NaiveDate) -> PortResult<u64> {
        let mut debts = self.debts.write().await;
        let mut affected = 0;
        for debt in debts
            .values_mut()
            .filter(|d| d.status == DebtStatus::Pending && d.due_date < today)
        {
            debt.status = DebtStatus::Overdue;
            debt.version += 1;
            affected += 1;
        }
        Ok(affected)
    }

    async fn get_debts_due_for_reminder(&self, today: NaiveDate) -> PortResult<Vec<Debt>> {
        let debts = self.debts.read().await;
        let due = debts
            .values()
            .filter(|d| is_due_for_reminder(d, today))
            .cloned()
            .collect();
        Ok(sorted_by_due_date(due))
    }

    async fn record_reminder(
        &self,
        id: Uuid,
        remind_at: DateTime<Utc>,
        sent_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut debts = self.debts.write().await;
        let stored = debts
            .get_mut(&id)
            .ok_or_else(|| PortError::NotFound(format!("Debt {} not found", id)))?;
        stored.remind_at = Some(remind_at);
        stored.sent_at = Some(sent_at);
        stored.version += 1;
        Ok(())
    }

    async fn sum_debts_in_range_by_type(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        debt_type: DebtType,
    ) -> PortResult<f64> {
        let debts = self.debts.read().await;
        Ok(debts
            .values()
            .filter(|d| {
                d.user_id == user_id
                    && d.debt_type == debt_type
                    && d.due_date >= start
                    && d.due_date <= end
            })
            .map(|d| d.amount)
            .sum())
    }
}

#[async_trait]
impl ExpenseReportStore for MemoryStore {
    async fn sum_expenses_in_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<f64> {
        let expenses = self.user_expenses_in_range(user_id, start, end).await;
        Ok(expenses.iter().map(|e| e.amount).sum())
    }

    async fn category_breakdown_in_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<CategoryTotal>> {
        let expenses = self.user_expenses_in_range(user_id, start, end).await;
        let categories = self.categories.read().await;

        let mut totals: HashMap<String, f64> = HashMap::new();
        for expense in expenses {
            let name = expense
                .category_id
                .and_then(|id| categories.get(&id))
                .map_or_else(|| UNCATEGORIZED.to_string(), |c| c.name.clone());
            *totals.entry(name).or_insert(0.0) += expense.amount;
        }

        let mut breakdown: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(category_name, total)| CategoryTotal { category_name, total })
            .collect();
        breakdown.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.category_name.cmp(&b.category_name))
        });
        Ok(breakdown)
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn create_expense(&self, expense: &Expense) -> PortResult<()> {
        let mut expenses = self.expenses.write().await;
        if expenses.contains_key(&expense.id) {
            return Err(PortError::Conflict(format!(
                "Expense {} already exists",
                expense.id
            )));
        }
        expenses.insert(expense.id, expense.clone());
        Ok(())
    }

    async fn get_expense_by_id(&self, id: Uuid) -> PortResult<Expense> {
        self.expenses
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| expense_not_found(id))
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> PortResult<Vec<Expense>> {
        let mut listed: Vec<Expense> = self
            .expenses
            .read()
            .await
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        listed.sort_by(|a, b| {
            b.expense_date
                .cmp(&a.expense_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(listed)
    }

    async fn update_expense(&self, expense: &Expense) -> PortResult<Expense> {
        let mut expenses = self.expenses.write().await;
        let stored = expenses
            .get_mut(&expense.id)
            .ok_or_else(|| expense_not_found(expense.id))?;

        stored.amount = expense.amount;
        stored.category_id = expense.category_id;
        stored.note = expense.note.clone();
        stored.expense_date = expense.expense_date;
        Ok(stored.clone())
    }

    async fn delete_expense(&self, id: Uuid) -> PortResult<()> {
        self.expenses
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| expense_not_found(id))
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn create_category(&self, category: &Category) -> PortResult<()> {
        let mut categories = self.categories.write().await;
        if categories.contains_key(&category.id) {
            return Err(PortError::Conflict(format!(
                "Category {} already exists",
                category.id
            )));
        }
        categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn get_category_by_id(&self, id: Uuid) -> PortResult<Category> {
        self.categories
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| category_not_found(id))
    }

    async fn list_categories(&self, user_id: Uuid) -> PortResult<Vec<Category>> {
        let mut visible: Vec<Category> = self
            .categories
            .read()
            .await
            .values()
            .filter(|c| c.is_visible_to(user_id))
            .cloned()
            .collect();
        visible.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(visible)
    }

    async fn rename_category(&self, id: Uuid, name: &str) -> PortResult<Category> {
        let mut categories = self.categories.write().await;
        let stored = categories.get_mut(&id).ok_or_else(|| category_not_found(id))?;
        stored.name = name.to_string();
        Ok(stored.clone())
    }

    async fn delete_category(&self, id: Uuid) -> PortResult<()> {
        // Lock order: categories, then expenses.
        let mut categories = self.categories.write().await;
        categories.remove(&id).ok_or_else(|| category_not_found(id))?;
        for expense in self
            .expenses
            .write()
            .await
            .values_mut()
            .filter(|e| e.category_id == Some(id))
        {
            expense.category_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Err(PortError::Conflict(format!("Email {} is already registered", email)));
        }
        let credentials = UserCredentials {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        let user = User {
            user_id: credentials.user_id,
            email: credentials.email.clone(),
        };
        users.insert(email.to_string(), credentials);
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.users
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.auth_sessions
            .write()
            .await
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Uuid> {
        match self.auth_sessions.read().await.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > now => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.auth_sessions.write().await.remove(session_id);
        Ok(())
    }
}
