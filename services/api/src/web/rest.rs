//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the debt endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{errors::debt_error_response, state::AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, NaiveDate, Utc};
use debt_tracker_core::domain::{Debt, DebtDraft, DebtType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_debt_handler,
        list_debts_handler,
        list_upcoming_debts_handler,
        get_debt_handler,
        update_debt_handler,
        mark_debt_paid_handler,
        crate::web::expenses::create_expense_handler,
        crate::web::expenses::list_expenses_handler,
        crate::web::expenses::get_expense_handler,
        crate::web::expenses::update_expense_handler,
        crate::web::expenses::delete_expense_handler,
        crate::web::categories::create_category_handler,
        crate::web::categories::list_categories_handler,
        crate::web::categories::get_category_handler,
        crate::web::categories::rename_category_handler,
        crate::web::categories::delete_category_handler,
        crate::web::reports::weekly_report_handler,
        crate::web::admin::overdue_sweep_handler,
        crate::web::admin::reminder_sweep_handler,
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
    ),
    components(
        schemas(
            CreateDebtRequest,
            UpdateDebtRequest,
            DebtResponse,
            crate::web::expenses::CreateExpenseRequest,
            crate::web::expenses::UpdateExpenseRequest,
            crate::web::expenses::ExpenseResponse,
            crate::web::categories::CategoryRequest,
            crate::web::categories::CategoryResponse,
            crate::web::reports::WeeklyReportResponse,
            crate::web::reports::CategoryTotalResponse,
            crate::web::admin::OverdueSweepResponse,
            crate::web::admin::ReminderSweepResponse,
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
        )
    ),
    tags(
        (name = "Debt Tracker API", description = "Debts, expenses, reminders and weekly reports.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Payload for creating a debt. The id is generated when omitted.
#[derive(Deserialize, ToSchema)]
pub struct CreateDebtRequest {
    pub id: Option<Uuid>,
    #[serde(rename = "type")]
    pub debt_type: String,
    pub peer_name: String,
    pub amount: f64,
    /// Calendar date, `YYYY-MM-DD`.
    pub due_date: String,
    #[serde(default)]
    pub reminder_enabled: bool,
    pub note: Option<String>,
}

/// Payload for replacing the editable fields of a debt.
#[derive(Deserialize, ToSchema)]
pub struct UpdateDebtRequest {
    #[serde(rename = "type")]
    pub debt_type: String,
    pub peer_name: String,
    pub amount: f64,
    /// Calendar date, `YYYY-MM-DD`.
    pub due_date: String,
    #[serde(default)]
    pub reminder_enabled: bool,
    pub note: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DebtResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub debt_type: String,
    pub peer_name: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub reminder_enabled: bool,
    pub remind_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub status: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

impl From<Debt> for DebtResponse {
    fn from(debt: Debt) -> Self {
        Self {
            id: debt.id,
            user_id: debt.user_id,
            debt_type: debt.debt_type.to_string(),
            peer_name: debt.peer_name,
            amount: debt.amount,
            due_date: debt.due_date,
            reminder_enabled: debt.reminder_enabled,
            remind_at: debt.remind_at,
            sent_at: debt.sent_at,
            status: debt.status.to_string(),
            note: debt.note,
            created_at: debt.created_at,
            version: debt.version,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UpcomingQuery {
    /// Horizon in days, today included. Defaults to 7.
    pub days: Option<i64>,
}

type HandlerError = (StatusCode, String);

//=========================================================================================
// Request Parsing Helpers
//=========================================================================================

/// Empty means missing (reported by the core); anything else must name a known type.
fn parse_debt_type(raw: &str) -> Result<Option<DebtType>, HandlerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<DebtType>().map(Some).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "type must be 'lent' or 'borrowed'".to_string(),
        )
    })
}

pub(crate) fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, HandlerError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("invalid {}", field)))
}

/// Loads a debt and checks the caller owns it.
async fn owned_debt(app_state: &AppState, user_id: Uuid, id: Uuid) -> Result<Debt, HandlerError> {
    let debt = app_state.debts.get(id).await.map_err(debt_error_response)?;
    if debt.user_id != user_id {
        return Err((StatusCode::FORBIDDEN, "forbidden".to_string()));
    }
    Ok(debt)
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a debt owned by the authenticated user.
#[utoipa::path(
    post,
    path = "/debts",
    request_body = CreateDebtRequest,
    responses(
        (status = 201, description = "Debt created", body = DebtResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not logged in"),
        (status = 409, description = "Id already taken")
    )
)]
pub async fn create_debt_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateDebtRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let draft = DebtDraft {
        id: req.id.unwrap_or_else(Uuid::new_v4),
        user_id,
        debt_type: parse_debt_type(&req.debt_type)?,
        peer_name: req.peer_name,
        amount: req.amount,
        due_date: parse_date(&req.due_date, "due_date")?,
        reminder_enabled: req.reminder_enabled,
        status: None,
        note: req.note,
    };

    let debt = app_state
        .debts
        .create(draft)
        .await
        .map_err(debt_error_response)?;
    Ok((StatusCode::CREATED, Json(DebtResponse::from(debt))))
}

/// List every debt of the authenticated user, earliest due date first.
#[utoipa::path(
    get,
    path = "/debts",
    responses(
        (status = 200, description = "The user's debts", body = [DebtResponse]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_debts_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let debts = app_state
        .debts
        .list_by_user(user_id)
        .await
        .map_err(debt_error_response)?;
    Ok(Json(
        debts.into_iter().map(DebtResponse::from).collect::<Vec<_>>(),
    ))
}

/// List pending debts falling due within the next `days` days.
#[utoipa::path(
    get,
    path = "/debts/upcoming",
    params(UpcomingQuery),
    responses(
        (status = 200, description = "Upcoming debts", body = [DebtResponse]),
        (status = 400, description = "Non-positive horizon")
    )
)]
pub async fn list_upcoming_debts_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<UpcomingQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let debts = app_state
        .debts
        .list_upcoming(user_id, query.days.unwrap_or(7))
        .await
        .map_err(debt_error_response)?;
    Ok(Json(
        debts.into_iter().map(DebtResponse::from).collect::<Vec<_>>(),
    ))
}

/// Fetch one debt.
#[utoipa::path(
    get,
    path = "/debts/{id}",
    params(("id" = Uuid, Path, description = "Debt id")),
    responses(
        (status = 200, description = "The debt", body = DebtResponse),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such debt")
    )
)]
pub async fn get_debt_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let debt = owned_debt(&app_state, user_id, id).await?;
    Ok(Json(DebtResponse::from(debt)))
}

/// Replace the editable fields of an unpaid debt.
#[utoipa::path(
    put,
    path = "/debts/{id}",
    params(("id" = Uuid, Path, description = "Debt id")),
    request_body = UpdateDebtRequest,
    responses(
        (status = 200, description = "Debt updated", body = DebtResponse),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such debt"),
        (status = 409, description = "Already paid or modified concurrently")
    )
)]
pub async fn update_debt_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDebtRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    owned_debt(&app_state, user_id, id).await?;

    let draft = DebtDraft {
        id,
        user_id,
        debt_type: parse_debt_type(&req.debt_type)?,
        peer_name: req.peer_name,
        amount: req.amount,
        due_date: parse_date(&req.due_date, "due_date")?,
        reminder_enabled: req.reminder_enabled,
        status: None,
        note: req.note,
    };

    let debt = app_state
        .debts
        .update(draft)
        .await
        .map_err(debt_error_response)?;
    Ok(Json(DebtResponse::from(debt)))
}

/// Settle a pending or overdue debt.
#[utoipa::path(
    post,
    path = "/debts/{id}/pay",
    params(("id" = Uuid, Path, description = "Debt id")),
    responses(
        (status = 200, description = "Debt marked paid", body = DebtResponse),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such debt"),
        (status = 409, description = "Already paid or modified concurrently")
    )
)]
pub async fn mark_debt_paid_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    owned_debt(&app_state, user_id, id).await?;

    let debt = app_state
        .debts
        .mark_paid(id)
        .await
        .map_err(debt_error_response)?;
    Ok(Json(DebtResponse::from(debt)))
}
