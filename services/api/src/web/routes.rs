//! services/api/src/web/routes.rs
//!
//! Assembles the HTTP router. The binary and the integration tests share it.

use crate::web::{
    admin::{overdue_sweep_handler, reminder_sweep_handler},
    auth::{login_handler, logout_handler, signup_handler},
    categories::{
        create_category_handler, delete_category_handler, get_category_handler,
        list_categories_handler, rename_category_handler,
    },
    expenses::{
        create_expense_handler, delete_expense_handler, get_expense_handler,
        list_expenses_handler, update_expense_handler,
    },
    middleware::{require_admin, require_auth},
    reports::weekly_report_handler,
    rest::{
        create_debt_handler, get_debt_handler, list_debts_handler, list_upcoming_debts_handler,
        mark_debt_paid_handler, update_debt_handler,
    },
    state::AppState,
};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Builds the API routes with their auth layers and binds the shared state.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/debts", post(create_debt_handler).get(list_debts_handler))
        .route("/debts/upcoming", get(list_upcoming_debts_handler))
        .route("/debts/{id}", get(get_debt_handler).put(update_debt_handler))
        .route("/debts/{id}/pay", post(mark_debt_paid_handler))
        .route(
            "/expenses",
            post(create_expense_handler).get(list_expenses_handler),
        )
        .route(
            "/expenses/{id}",
            get(get_expense_handler)
                .put(update_expense_handler)
                .delete(delete_expense_handler),
        )
        .route(
            "/categories",
            post(create_category_handler).get(list_categories_handler),
        )
        .route(
            "/categories/{id}",
            get(get_category_handler)
                .put(rename_category_handler)
                .delete(delete_category_handler),
        )
        .route("/reports/weekly", get(weekly_report_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let admin_routes = Router::new()
        .route("/admin/sweeps/overdue", post(overdue_sweep_handler))
        .route("/admin/sweeps/reminders", post(reminder_sweep_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .with_state(app_state)
}
