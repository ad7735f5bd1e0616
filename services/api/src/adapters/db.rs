//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the storage ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use debt_tracker_core::domain::{
    Category, CategoryTotal, Debt, DebtStatus, DebtType, Expense, ExpenseFilter, User,
    UserCredentials, UNCATEGORIZED,
};
use debt_tracker_core::ports::{
    AccountStore, CategoryStore, DebtStore, ExpenseReportStore, ExpenseStore, PortError,
    PortResult,
};
use debt_tracker_core::sweeps::REMINDER_OFFSETS;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const DEBT_COLUMNS: &str = "id, user_id, debt_type, peer_name, amount, due_date, \
     reminder_enabled, remind_at, sent_at, status, note, created_at, version";

const EXPENSE_COLUMNS: &str = "id, user_id, amount, category_id, note, expense_date, created_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every storage port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Explains why a conditional write on `id` matched no row.
    async fn conflict_or_missing(&self, id: Uuid, expected_version: i64) -> PortError {
        let current: Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT version FROM debts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;
        match current {
            Ok(Some(version)) => PortError::Conflict(format!(
                "Debt {} is at version {}, expected {}",
                id, version, expected_version
            )),
            Ok(None) => PortError::NotFound(format!("Debt {} not found", id)),
            Err(e) => unexpected(e),
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps a failed insert, turning a primary key collision into a conflict.
fn insert_error(e: sqlx::Error, what: &str, id: Uuid) -> PortError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            PortError::Conflict(format!("{} {} already exists", what, id))
        }
        _ => unexpected(e),
    }
}

fn missing_row(e: sqlx::Error, what: &str, id: Uuid) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} {} not found", what, id)),
        _ => unexpected(e),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DebtRecord {
    id: Uuid,
    user_id: Uuid,
    debt_type: String,
    peer_name: String,
    amount: f64,
    due_date: NaiveDate,
    reminder_enabled: bool,
    remind_at: Option<DateTime<Utc>>,
    sent_at: Option<DateTime<Utc>>,
    status: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
    version: i64,
}
impl DebtRecord {
    fn to_domain(self) -> PortResult<Debt> {
        let debt_type = self
            .debt_type
            .parse::<DebtType>()
            .map_err(|e| PortError::Unexpected(format!("debt {}: {}", self.id, e)))?;
        let status = self
            .status
            .parse::<DebtStatus>()
            .map_err(|e| PortError::Unexpected(format!("debt {}: {}", self.id, e)))?;
        Ok(Debt {
            id: self.id,
            user_id: self.user_id,
            debt_type,
            peer_name: self.peer_name,
            amount: self.amount,
            due_date: self.due_date,
            reminder_enabled: self.reminder_enabled,
            remind_at: self.remind_at,
            sent_at: self.sent_at,
            status,
            note: self.note,
            created_at: self.created_at,
            version: self.version,
        })
    }
}

fn to_domain_all(records: Vec<DebtRecord>) -> PortResult<Vec<Debt>> {
    records.into_iter().map(DebtRecord::to_domain).collect()
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}

#[derive(FromRow)]
struct ExpenseRecord {
    id: Uuid,
    user_id: Uuid,
    amount: f64,
    category_id: Option<Uuid>,
    note: Option<String>,
    expense_date: NaiveDate,
    created_at: DateTime<Utc>,
}
impl From<ExpenseRecord> for Expense {
    fn from(record: ExpenseRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            amount: record.amount,
            category_id: record.category_id,
            note: record.note,
            expense_date: record.expense_date,
            created_at: record.created_at,
        }
    }
}

#[derive(FromRow)]
struct CategoryRecord {
    id: Uuid,
    name: String,
    user_id: Option<Uuid>,
}
impl From<CategoryRecord> for Category {
    fn from(record: CategoryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            user_id: record.user_id,
        }
    }
}

#[derive(FromRow)]
struct CategoryTotalRecord {
    category_name: String,
    total: f64,
}

//=========================================================================================
// `DebtStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DebtStore for DbAdapter {
    async fn create_debt(&self, debt: &Debt) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO debts (id, user_id, debt_type, peer_name, amount, due_date, \
             reminder_enabled, remind_at, sent_at, status, note, created_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(debt.id)
        .bind(debt.user_id)
        .bind(debt.debt_type.as_str())
        .bind(&debt.peer_name)
        .bind(debt.amount)
        .bind(debt.due_date)
        .bind(debt.reminder_enabled)
        .bind(debt.remind_at)
        .bind(debt.sent_at)
        .bind(debt.status.as_str())
        .bind(&debt.note)
        .bind(debt.created_at)
        .bind(debt.version)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, "Debt", debt.id))?;
        Ok(())
    }

    async fn update_debt(&self, debt: &Debt, expected_version: i64) -> PortResult<Debt> {
        let query = format!(
            "UPDATE debts SET debt_type = $1, peer_name = $2, amount = $3, due_date = $4, \
             reminder_enabled = $5, remind_at = $6, sent_at = $7, status = $8, note = $9, \
             version = version + 1 \
             WHERE id = $10 AND version = $11 RETURNING {}",
            DEBT_COLUMNS
        );
        let record = sqlx::query_as::<_, DebtRecord>(&query)
            .bind(debt.debt_type.as_str())
            .bind(&debt.peer_name)
            .bind(debt.amount)
            .bind(debt.due_date)
            .bind(debt.reminder_enabled)
            .bind(debt.remind_at)
            .bind(debt.sent_at)
            .bind(debt.status.as_str())
            .bind(&debt.note)
            .bind(debt.id)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        match record {
            Some(record) => record.to_domain(),
            None => Err(self.conflict_or_missing(debt.id, expected_version).await),
        }
    }

    async fn get_debt_by_id(&self, id: Uuid) -> PortResult<Debt> {
        let query = format!("SELECT {} FROM debts WHERE id = $1", DEBT_COLUMNS);
        let record = sqlx::query_as::<_, DebtRecord>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| missing_row(e, "Debt", id))?;
        record.to_domain()
    }

    async fn list_debts_by_user(&self, user_id: Uuid) -> PortResult<Vec<Debt>> {
        let query = format!(
            "SELECT {} FROM debts WHERE user_id = $1 ORDER BY due_date ASC, created_at ASC",
            DEBT_COLUMNS
        );
        let records = sqlx::query_as::<_, DebtRecord>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_domain_all(records)
    }

    async fn list_upcoming_debts(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        until: NaiveDate,
    ) -> PortResult<Vec<Debt>> {
        let query = format!(
            "SELECT {} FROM debts \
             WHERE user_id = $1 AND status = $2 AND due_date >= $3 AND due_date <= $4 \
             ORDER BY due_date ASC, created_at ASC",
            DEBT_COLUMNS
        );
        let records = sqlx::query_as::<_, DebtRecord>(&query)
            .bind(user_id)
            .bind(DebtStatus::Pending.as_str())
            .bind(today)
            .bind(until)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_domain_all(records)
    }

    async fn mark_debt_paid(
        &self,
        id: Uuid,
        expected_version: i64,
        paid_at: DateTime<Utc>,
    ) -> PortResult<Debt> {
        let query = format!(
            "UPDATE debts SET status = $1, sent_at = $2, version = version + 1 \
             WHERE id = $3 AND version = $4 RETURNING {}",
            DEBT_COLUMNS
        );
        let record = sqlx::query_as::<_, DebtRecord>(&query)
            .bind(DebtStatus::Paid.as_str())
            .bind(paid_at)
            .bind(id)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        match record {
            Some(record) => record.to_domain(),
            None => Err(self.conflict_or_missing(id, expected_version).await),
        }
    }

    async fn set_overdue(&self, today: NaiveDate) -> PortResult<u64> {
        let result = sqlx::query(
            "UPDATE debts SET status = $1, version = version + 1 \
             WHERE status = $2 AND due_date < $3",
        )
        .bind(DebtStatus::Overdue.as_str())
        .bind(DebtStatus::Pending.as_str())
        .bind(today)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn get_debts_due_for_reminder(&self, today: NaiveDate) -> PortResult<Vec<Debt>> {
        let window: Vec<NaiveDate> = REMINDER_OFFSETS
            .iter()
            .map(|offset| today + Duration::days(*offset))
            .collect();
        let query = format!(
            "SELECT {} FROM debts \
             WHERE status = $1 AND reminder_enabled = TRUE \
               AND due_date = ANY($2) \
               AND (sent_at IS NULL OR (sent_at AT TIME ZONE 'UTC')::date < $3) \
             ORDER BY due_date ASC, created_at ASC",
            DEBT_COLUMNS
        );
        let records = sqlx::query_as::<_, DebtRecord>(&query)
            .bind(DebtStatus::Pending.as_str())
            .bind(window)
            .bind(today)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        to_domain_all(records)
    }

    async fn record_reminder(
        &self,
        id: Uuid,
        remind_at: DateTime<Utc>,
        sent_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE debts SET remind_at = $1, sent_at = $2, version = version + 1 WHERE id = $3",
        )
        .bind(remind_at)
        .bind(sent_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Debt {} not found", id)));
        }
        Ok(())
    }

    async fn sum_debts_in_range_by_type(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        debt_type: DebtType,
    ) -> PortResult<f64> {
        sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(amount), 0)::DOUBLE PRECISION FROM debts \
             WHERE user_id = $1 AND debt_type = $2 AND due_date >= $3 AND due_date <= $4",
        )
        .bind(user_id)
        .bind(debt_type.as_str())
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }
}

//=========================================================================================
// `ExpenseReportStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ExpenseReportStore for DbAdapter {
    async fn sum_expenses_in_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<f64> {
        sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(amount), 0)::DOUBLE PRECISION FROM expenses \
             WHERE user_id = $1 AND expense_date >= $2 AND expense_date <= $3",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn category_breakdown_in_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<CategoryTotal>> {
        let records = sqlx::query_as::<_, CategoryTotalRecord>(
            "SELECT COALESCE(c.name, $4) AS category_name, \
                    COALESCE(SUM(e.amount), 0)::DOUBLE PRECISION AS total \
             FROM expenses e LEFT JOIN categories c ON e.category_id = c.id \
             WHERE e.user_id = $1 AND e.expense_date >= $2 AND e.expense_date <= $3 \
             GROUP BY 1 ORDER BY total DESC, category_name ASC",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(UNCATEGORIZED)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records
            .into_iter()
            .map(|r| CategoryTotal {
                category_name: r.category_name,
                total: r.total,
            })
            .collect())
    }
}

//=========================================================================================
// `ExpenseStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ExpenseStore for DbAdapter {
    async fn create_expense(&self, expense: &Expense) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO expenses (id, user_id, amount, category_id, note, expense_date, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(expense.id)
        .bind(expense.user_id)
        .bind(expense.amount)
        .bind(expense.category_id)
        .bind(&expense.note)
        .bind(expense.expense_date)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, "Expense", expense.id))?;
        Ok(())
    }

    async fn get_expense_by_id(&self, id: Uuid) -> PortResult<Expense> {
        let query = format!("SELECT {} FROM expenses WHERE id = $1", EXPENSE_COLUMNS);
        let record = sqlx::query_as::<_, ExpenseRecord>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| missing_row(e, "Expense", id))?;
        Ok(record.into())
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> PortResult<Vec<Expense>> {
        // NULL parameters switch the matching predicate off.
        let query = format!(
            "SELECT {} FROM expenses \
             WHERE user_id = $1 \
               AND ($2::UUID IS NULL OR category_id = $2) \
               AND ($3::DATE IS NULL OR expense_date >= $3) \
               AND ($4::DATE IS NULL OR expense_date <= $4) \
             ORDER BY expense_date DESC, created_at DESC",
            EXPENSE_COLUMNS
        );
        let records = sqlx::query_as::<_, ExpenseRecord>(&query)
            .bind(filter.user_id)
            .bind(filter.category_id)
            .bind(filter.from_date)
            .bind(filter.to_date)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(Expense::from).collect())
    }

    async fn update_expense(&self, expense: &Expense) -> PortResult<Expense> {
        let query = format!(
            "UPDATE expenses SET amount = $1, category_id = $2, note = $3, expense_date = $4 \
             WHERE id = $5 RETURNING {}",
            EXPENSE_COLUMNS
        );
        let record = sqlx::query_as::<_, ExpenseRecord>(&query)
            .bind(expense.amount)
            .bind(expense.category_id)
            .bind(&expense.note)
            .bind(expense.expense_date)
            .bind(expense.id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| missing_row(e, "Expense", expense.id))?;
        Ok(record.into())
    }

    async fn delete_expense(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Expense {} not found", id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `CategoryStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CategoryStore for DbAdapter {
    async fn create_category(&self, category: &Category) -> PortResult<()> {
        sqlx::query("INSERT INTO categories (id, name, user_id) VALUES ($1, $2, $3)")
            .bind(category.id)
            .bind(&category.name)
            .bind(category.user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(e, "Category", category.id))?;
        Ok(())
    }

    async fn get_category_by_id(&self, id: Uuid) -> PortResult<Category> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, user_id FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_row(e, "Category", id))?;
        Ok(record.into())
    }

    async fn list_categories(&self, user_id: Uuid) -> PortResult<Vec<Category>> {
        let records = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, user_id FROM categories \
             WHERE user_id IS NULL OR user_id = $1 \
             ORDER BY name ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(Category::from).collect())
    }

    async fn rename_category(&self, id: Uuid, name: &str) -> PortResult<Category> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "UPDATE categories SET name = $1 WHERE id = $2 RETURNING id, name, user_id",
        )
        .bind(name)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_row(e, "Category", id))?;
        Ok(record.into())
    }

    async fn delete_category(&self, id: Uuid) -> PortResult<()> {
        // expenses.category_id is ON DELETE SET NULL.
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `AccountStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountStore for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (email, hashed_password) VALUES ($1, $2) \
             RETURNING user_id, email, hashed_password",
        )
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::Conflict(format!("Email {} is already registered", email))
            }
            _ => unexpected(e),
        })?;

        Ok(User {
            user_id: record.user_id,
            email: record.email,
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;

        Ok(UserCredentials {
            user_id: record.user_id,
            email: record.email,
            hashed_password: record.hashed_password,
        })
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > $2",
        )
        .bind(session_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
