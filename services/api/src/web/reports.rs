//! services/api/src/web/reports.rs
//!
//! Weekly summary endpoint.

use crate::web::{errors::debt_error_response, rest::parse_date, state::AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::NaiveDate;
use debt_tracker_core::domain::{CategoryTotal, WeeklyReport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// First day of the window, `YYYY-MM-DD`.
    pub start: Option<String>,
    /// Last day of the window, inclusive.
    pub end: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CategoryTotalResponse {
    pub category_name: String,
    pub total: f64,
}

#[derive(Serialize, ToSchema)]
pub struct WeeklyReportResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_expense: f64,
    pub total_lent: f64,
    pub total_borrowed: f64,
    pub category_breakdown: Vec<CategoryTotalResponse>,
}

impl From<CategoryTotal> for CategoryTotalResponse {
    fn from(c: CategoryTotal) -> Self {
        Self {
            category_name: c.category_name,
            total: c.total,
        }
    }
}

impl From<WeeklyReport> for WeeklyReportResponse {
    fn from(report: WeeklyReport) -> Self {
        Self {
            start_date: report.start_date,
            end_date: report.end_date,
            total_expense: report.total_expense,
            total_lent: report.total_lent,
            total_borrowed: report.total_borrowed,
            category_breakdown: report
                .category_breakdown
                .into_iter()
                .map(CategoryTotalResponse::from)
                .collect(),
        }
    }
}

/// Expense and debt totals for the authenticated user over `[start, end]`.
#[utoipa::path(
    get,
    path = "/reports/weekly",
    params(ReportQuery),
    responses(
        (status = 200, description = "Report for the window", body = WeeklyReportResponse),
        (status = 400, description = "Missing, malformed or reversed dates"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn weekly_report_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (Some(start), Some(end)) = (query.start.as_deref(), query.end.as_deref()) else {
        return Err((
            StatusCode::BAD_REQUEST,
            "start and end are required".to_string(),
        ));
    };
    let start = parse_date(start, "start date")?;
    let end = parse_date(end, "end date")?;

    let report = app_state
        .reports
        .get_weekly_report(user_id, start, end)
        .await
        .map_err(debt_error_response)?;
    Ok(Json(WeeklyReportResponse::from(report)))
}
