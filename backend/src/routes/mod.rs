//! Route definitions for the stock ledger API

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Writes
        .route("/supply", post(handlers::record_supplies))
        .route("/sales", post(handlers::record_sales))
        // Derived views
        .route("/availability", get(handlers::get_availability))
        .route("/issues", get(handlers::get_issues))
        .route("/profit", get(handlers::get_profit))
        // Administration
        .route("/flush", delete(handlers::flush))
}
