//! services/api/src/web/expenses.rs
//!
//! Handlers for recording and browsing the authenticated user's expenses.

use crate::web::{errors::debt_error_response, rest::parse_date, state::AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, NaiveDate, Utc};
use debt_tracker_core::domain::{Expense, ExpenseDraft, ExpenseFilter, ExpensePatch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Payload for recording an expense. The id is generated when omitted.
#[derive(Deserialize, ToSchema)]
pub struct CreateExpenseRequest {
    pub id: Option<Uuid>,
    pub amount: f64,
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
    /// Calendar date, `YYYY-MM-DD`.
    pub expense_date: String,
}

/// Omitted fields keep their stored value.
#[derive(Deserialize, ToSchema)]
pub struct UpdateExpenseRequest {
    pub amount: Option<f64>,
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
    pub expense_date: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ExpenseResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
    pub expense_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseResponse {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            user_id: expense.user_id,
            amount: expense.amount,
            category_id: expense.category_id,
            note: expense.note,
            expense_date: expense.expense_date,
            created_at: expense.created_at,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpenseQuery {
    /// Earliest expense date, inclusive.
    pub from_date: Option<String>,
    /// Latest expense date, inclusive.
    pub to_date: Option<String>,
    pub category_id: Option<Uuid>,
}

type HandlerError = (StatusCode, String);

fn parse_optional_date(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>, HandlerError> {
    raw.map(|raw| parse_date(raw, field)).transpose()
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Record an expense for the authenticated user.
#[utoipa::path(
    post,
    path = "/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded", body = ExpenseResponse),
        (status = 400, description = "Validation failed or unknown category"),
        (status = 401, description = "Not logged in"),
        (status = 409, description = "Id already taken")
    )
)]
pub async fn create_expense_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let draft = ExpenseDraft {
        id: req.id.unwrap_or_else(Uuid::new_v4),
        user_id,
        amount: req.amount,
        category_id: req.category_id,
        note: req.note,
        expense_date: parse_date(&req.expense_date, "expense_date")?,
    };

    let expense = app_state
        .expenses
        .create(draft)
        .await
        .map_err(debt_error_response)?;
    Ok((StatusCode::CREATED, Json(ExpenseResponse::from(expense))))
}

/// List the user's expenses, most recent first.
#[utoipa::path(
    get,
    path = "/expenses",
    params(ExpenseQuery),
    responses(
        (status = 200, description = "Matching expenses", body = [ExpenseResponse]),
        (status = 400, description = "Malformed or reversed date range"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_expenses_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<ExpenseQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let filter = ExpenseFilter {
        user_id,
        category_id: query.category_id,
        from_date: parse_optional_date(query.from_date.as_deref(), "from_date")?,
        to_date: parse_optional_date(query.to_date.as_deref(), "to_date")?,
    };

    let expenses = app_state
        .expenses
        .list(filter)
        .await
        .map_err(debt_error_response)?;
    Ok(Json(
        expenses
            .into_iter()
            .map(ExpenseResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// Fetch one expense.
#[utoipa::path(
    get,
    path = "/expenses/{id}",
    params(("id" = Uuid, Path, description = "Expense id")),
    responses(
        (status = 200, description = "The expense", body = ExpenseResponse),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such expense")
    )
)]
pub async fn get_expense_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let expense = app_state
        .expenses
        .get(user_id, id)
        .await
        .map_err(debt_error_response)?;
    Ok(Json(ExpenseResponse::from(expense)))
}

/// Change some fields of an expense.
#[utoipa::path(
    put,
    path = "/expenses/{id}",
    params(("id" = Uuid, Path, description = "Expense id")),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = ExpenseResponse),
        (status = 400, description = "Validation failed or unknown category"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such expense")
    )
)]
pub async fn update_expense_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let patch = ExpensePatch {
        amount: req.amount,
        category_id: req.category_id,
        note: req.note,
        expense_date: parse_optional_date(req.expense_date.as_deref(), "expense_date")?,
    };

    let expense = app_state
        .expenses
        .update(user_id, id, patch)
        .await
        .map_err(debt_error_response)?;
    Ok(Json(ExpenseResponse::from(expense)))
}

/// Delete an expense.
#[utoipa::path(
    delete,
    path = "/expenses/{id}",
    params(("id" = Uuid, Path, description = "Expense id")),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such expense")
    )
)]
pub async fn delete_expense_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    app_state
        .expenses
        .delete(user_id, id)
        .await
        .map_err(debt_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
