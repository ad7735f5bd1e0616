//! services/api/src/web/categories.rs
//!
//! Handlers for the category list and the user's own categories.

use crate::web::{errors::debt_error_response, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use debt_tracker_core::domain::Category;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    /// Absent for global categories.
    pub user_id: Option<Uuid>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            user_id: category.user_id,
        }
    }
}

type HandlerError = (StatusCode, String);

/// Create a category owned by the authenticated user.
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Blank name"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn create_category_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CategoryRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let category = app_state
        .categories
        .create(user_id, &req.name)
        .await
        .map_err(debt_error_response)?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

/// List global categories together with the user's own, by name.
#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "Visible categories", body = [CategoryResponse]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_categories_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let categories = app_state
        .categories
        .list(user_id)
        .await
        .map_err(debt_error_response)?;
    Ok(Json(
        categories
            .into_iter()
            .map(CategoryResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "The category", body = CategoryResponse),
        (status = 404, description = "No such category")
    )
)]
pub async fn get_category_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let category = app_state
        .categories
        .get(user_id, id)
        .await
        .map_err(debt_error_response)?;
    Ok(Json(CategoryResponse::from(category)))
}

/// Rename one of the user's own categories.
#[utoipa::path(
    put,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category renamed", body = CategoryResponse),
        (status = 400, description = "Blank name"),
        (status = 403, description = "Global category"),
        (status = 404, description = "No such category")
    )
)]
pub async fn rename_category_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
    Json(req): Json<CategoryRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let category = app_state
        .categories
        .rename(user_id, id, &req.name)
        .await
        .map_err(debt_error_response)?;
    Ok(Json(CategoryResponse::from(category)))
}

/// Delete one of the user's own categories. Its expenses become uncategorized.
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Global category"),
        (status = 404, description = "No such category")
    )
)]
pub async fn delete_category_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    app_state
        .categories
        .delete(user_id, id)
        .await
        .map_err(debt_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
