//! crates/debt_tracker_core/src/expenses.rs
//!
//! Owner-scoped expense bookkeeping. These records feed the weekly report.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Expense, ExpenseDraft, ExpenseFilter, ExpensePatch};
use crate::error::{DebtError, DebtResult};
use crate::ports::{CategoryStore, ExpenseStore, PortError};

#[derive(Clone)]
pub struct ExpenseService {
    expenses: Arc<dyn ExpenseStore>,
    categories: Arc<dyn CategoryStore>,
    clock: Arc<dyn Clock>,
}

impl ExpenseService {
    pub fn new(
        expenses: Arc<dyn ExpenseStore>,
        categories: Arc<dyn CategoryStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            expenses,
            categories,
            clock,
        }
    }

    pub async fn create(&self, draft: ExpenseDraft) -> DebtResult<Expense> {
        if draft.id.is_nil() {
            return Err(DebtError::MissingField("expense id"));
        }
        if draft.user_id.is_nil() {
            return Err(DebtError::MissingField("user id"));
        }
        validate_amount(draft.amount)?;
        self.ensure_category_usable(draft.user_id, draft.category_id)
            .await?;

        let expense = Expense {
            id: draft.id,
            user_id: draft.user_id,
            amount: draft.amount,
            category_id: draft.category_id,
            note: draft.note,
            expense_date: draft.expense_date,
            created_at: self.clock.utc(),
        };
        self.expenses.create_expense(&expense).await?;

        info!(expense_id = %expense.id, user_id = %expense.user_id, "expense recorded");
        Ok(expense)
    }

    /// Fetches an expense owned by `user_id`.
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> DebtResult<Expense> {
        let expense = self.expenses.get_expense_by_id(id).await?;
        if expense.user_id != user_id {
            return Err(DebtError::Forbidden(format!("expense {}", id)));
        }
        Ok(expense)
    }

    pub async fn list(&self, filter: ExpenseFilter) -> DebtResult<Vec<Expense>> {
        if filter.user_id.is_nil() {
            return Err(DebtError::MissingField("user id"));
        }
        if let (Some(from), Some(to)) = (filter.from_date, filter.to_date) {
            if to < from {
                return Err(DebtError::InvalidDateRange);
            }
        }
        Ok(self.expenses.list_expenses(&filter).await?)
    }

    /// Applies the fields present in `patch` and revalidates the result.
    pub async fn update(&self, user_id: Uuid, id: Uuid, patch: ExpensePatch) -> DebtResult<Expense> {
        let mut expense = self.get(user_id, id).await?;

        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
            expense.amount = amount;
        }
        if patch.category_id.is_some() {
            self.ensure_category_usable(user_id, patch.category_id)
                .await?;
            expense.category_id = patch.category_id;
        }
        if patch.note.is_some() {
            expense.note = patch.note;
        }
        if let Some(expense_date) = patch.expense_date {
            expense.expense_date = expense_date;
        }

        let stored = self.expenses.update_expense(&expense).await?;
        info!(expense_id = %id, "expense updated");
        Ok(stored)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> DebtResult<()> {
        self.get(user_id, id).await?;
        self.expenses.delete_expense(id).await?;
        info!(expense_id = %id, "expense deleted");
        Ok(())
    }

    /// Expenses may only be filed under global categories or the owner's own.
    async fn ensure_category_usable(&self, user_id: Uuid, category_id: Option<Uuid>) -> DebtResult<()> {
        let Some(category_id) = category_id else {
            return Ok(());
        };
        match self.categories.get_category_by_id(category_id).await {
            Ok(category) if category.is_visible_to(user_id) => Ok(()),
            Ok(_) | Err(PortError::NotFound(_)) => Err(DebtError::UnknownCategory),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_amount(amount: f64) -> DebtResult<()> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(DebtError::InvalidAmount);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::memory::MemoryStore;
    use crate::ports::{MockCategoryStore, MockExpenseStore};
    use crate::test_support::{date, fixture_clock, fixture_now};
    use rstest::rstest;

    fn service(store: &MemoryStore) -> ExpenseService {
        ExpenseService::new(Arc::new(store.clone()), Arc::new(store.clone()), fixture_clock())
    }

    fn draft(user_id: Uuid, category_id: Option<Uuid>) -> ExpenseDraft {
        ExpenseDraft {
            id: Uuid::new_v4(),
            user_id,
            amount: 18.5,
            category_id,
            note: Some("lunch".to_string()),
            expense_date: date(2024, 6, 8),
        }
    }

    async fn category(store: &MemoryStore, name: &str, user_id: Option<Uuid>) -> Uuid {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            user_id,
        };
        store.insert_category(category.clone()).await;
        category.id
    }

    #[tokio::test]
    async fn create_accepts_global_and_own_categories() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let food = category(&store, "Food", None).await;
        let hobby = category(&store, "Climbing", Some(user_id)).await;
        let service = service(&store);

        let first = service.create(draft(user_id, Some(food))).await.unwrap();
        let second = service.create(draft(user_id, Some(hobby))).await.unwrap();
        let third = service.create(draft(user_id, None)).await.unwrap();

        assert_eq!(first.created_at, fixture_now());
        assert_eq!(second.category_id, Some(hobby));
        assert_eq!(third.category_id, None);
    }

    #[tokio::test]
    async fn create_rejects_someone_elses_or_missing_category() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let private = category(&store, "Theirs", Some(Uuid::new_v4())).await;
        let service = service(&store);

        let err = service.create(draft(user_id, Some(private))).await.unwrap_err();
        assert!(matches!(err, DebtError::UnknownCategory));

        let err = service
            .create(draft(user_id, Some(Uuid::new_v4())))
            .await
            .unwrap_err();
        assert!(matches!(err, DebtError::UnknownCategory));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-4.0)]
    #[case(f64::NAN)]
    #[tokio::test]
    async fn create_rejects_non_positive_amount(#[case] amount: f64) {
        let store = MemoryStore::new();
        let mut draft = draft(Uuid::new_v4(), None);
        draft.amount = amount;

        let err = service(&store).create(draft).await.unwrap_err();

        assert!(matches!(err, DebtError::InvalidAmount));
    }

    #[tokio::test]
    async fn create_with_a_taken_id_is_a_conflict() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let draft = draft(user_id, None);
        let service = service(&store);
        service.create(draft.clone()).await.unwrap();

        let err = service.create(draft).await.unwrap_err();

        assert!(matches!(err, DebtError::Conflict(_)));
    }

    #[tokio::test]
    async fn another_users_expense_is_forbidden() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let service = service(&store);
        let expense = service.create(draft(owner, None)).await.unwrap();
        let intruder = Uuid::new_v4();

        assert!(matches!(
            service.get(intruder, expense.id).await.unwrap_err(),
            DebtError::Forbidden(_)
        ));
        assert!(matches!(
            service
                .update(intruder, expense.id, ExpensePatch::default())
                .await
                .unwrap_err(),
            DebtError::Forbidden(_)
        ));
        assert!(matches!(
            service.delete(intruder, expense.id).await.unwrap_err(),
            DebtError::Forbidden(_)
        ));
        assert_eq!(service.get(owner, expense.id).await.unwrap(), expense);
    }

    #[tokio::test]
    async fn update_changes_only_the_patched_fields() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let food = category(&store, "Food", None).await;
        let service = service(&store);
        let expense = service.create(draft(user_id, None)).await.unwrap();

        let patch = ExpensePatch {
            amount: Some(22.0),
            category_id: Some(food),
            ..ExpensePatch::default()
        };
        let updated = service.update(user_id, expense.id, patch).await.unwrap();

        assert_eq!(updated.amount, 22.0);
        assert_eq!(updated.category_id, Some(food));
        assert_eq!(updated.note, expense.note);
        assert_eq!(updated.expense_date, expense.expense_date);

        let err = service
            .update(
                user_id,
                expense.id,
                ExpensePatch {
                    amount: Some(0.0),
                    ..ExpensePatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DebtError::InvalidAmount));
    }

    #[tokio::test]
    async fn list_filters_by_window_and_category() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let food = category(&store, "Food", None).await;
        let service = service(&store);
        let mut early = draft(user_id, Some(food));
        early.expense_date = date(2024, 6, 1);
        let early = service.create(early).await.unwrap();
        let late = service.create(draft(user_id, None)).await.unwrap();
        service.create(draft(Uuid::new_v4(), None)).await.unwrap();

        let all = service
            .list(ExpenseFilter {
                user_id,
                category_id: None,
                from_date: None,
                to_date: None,
            })
            .await
            .unwrap();
        assert_eq!(all, vec![late.clone(), early.clone()]);

        let food_only = service
            .list(ExpenseFilter {
                user_id,
                category_id: Some(food),
                from_date: None,
                to_date: None,
            })
            .await
            .unwrap();
        assert_eq!(food_only, vec![early]);

        let window = service
            .list(ExpenseFilter {
                user_id,
                category_id: None,
                from_date: Some(date(2024, 6, 8)),
                to_date: Some(date(2024, 6, 8)),
            })
            .await
            .unwrap();
        assert_eq!(window, vec![late]);

        let err = service
            .list(ExpenseFilter {
                user_id,
                category_id: None,
                from_date: Some(date(2024, 6, 9)),
                to_date: Some(date(2024, 6, 1)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DebtError::InvalidDateRange));
    }

    #[tokio::test]
    async fn delete_removes_the_expense() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let service = service(&store);
        let expense = service.create(draft(user_id, None)).await.unwrap();

        service.delete(user_id, expense.id).await.unwrap();

        assert!(matches!(
            service.get(user_id, expense.id).await.unwrap_err(),
            DebtError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn category_lookup_failure_is_not_reported_as_unknown() {
        let mut categories = MockCategoryStore::new();
        categories
            .expect_get_category_by_id()
            .times(1)
            .return_once(|_| Err(PortError::Unexpected("pool timed out".to_string())));
        let mut expenses = MockExpenseStore::new();
        expenses.expect_create_expense().never();

        let service = ExpenseService::new(Arc::new(expenses), Arc::new(categories), fixture_clock());
        let err = service
            .create(draft(Uuid::new_v4(), Some(Uuid::new_v4())))
            .await
            .unwrap_err();

        assert!(matches!(err, DebtError::Port(PortError::Unexpected(_))));
    }
}
