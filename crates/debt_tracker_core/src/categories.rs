//! crates/debt_tracker_core/src/categories.rs
//!
//! User-defined spending categories alongside the read-only global set.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::Category;
use crate::error::{DebtError, DebtResult};
use crate::ports::CategoryStore;

#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryStore>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryStore>) -> Self {
        Self { categories }
    }

    /// Creates a category owned by `user_id`.
    pub async fn create(&self, user_id: Uuid, name: &str) -> DebtResult<Category> {
        if user_id.is_nil() {
            return Err(DebtError::MissingField("user id"));
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: validate_name(name)?,
            user_id: Some(user_id),
        };
        self.categories.create_category(&category).await?;

        info!(category_id = %category.id, %user_id, "category created");
        Ok(category)
    }

    pub async fn list(&self, user_id: Uuid) -> DebtResult<Vec<Category>> {
        Ok(self.categories.list_categories(user_id).await?)
    }

    /// Another user's private category is reported as missing.
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> DebtResult<Category> {
        let category = self.categories.get_category_by_id(id).await?;
        if !category.is_visible_to(user_id) {
            return Err(DebtError::NotFound(format!("Category {} not found", id)));
        }
        Ok(category)
    }

    pub async fn rename(&self, user_id: Uuid, id: Uuid, name: &str) -> DebtResult<Category> {
        self.owned(user_id, id).await?;
        let renamed = self
            .categories
            .rename_category(id, &validate_name(name)?)
            .await?;
        info!(category_id = %id, "category renamed");
        Ok(renamed)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> DebtResult<()> {
        self.owned(user_id, id).await?;
        self.categories.delete_category(id).await?;
        info!(category_id = %id, "category deleted");
        Ok(())
    }

    async fn owned(&self, user_id: Uuid, id: Uuid) -> DebtResult<Category> {
        let category = self.get(user_id, id).await?;
        if category.is_global() {
            return Err(DebtError::Forbidden(format!(
                "category {} is global and read-only",
                id
            )));
        }
        Ok(category)
    }
}

fn validate_name(name: &str) -> DebtResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DebtError::MissingField("category name"));
    }
    Ok(name.to_string())
}
