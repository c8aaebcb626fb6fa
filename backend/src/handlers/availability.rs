//! HTTP handlers for availability, issues and profit queries

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{parse_timestamp, AvailabilityRecord, DataEnvelope, IssueView, TimeWindow, Timestamp};

use crate::error::AppResult;
use crate::services::AvailabilityService;
use crate::AppState;

/// Query parameters for `/availability`
#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub to: Option<String>,
}

/// Query parameters for `/issues` and `/profit`
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl WindowQuery {
    fn window(&self) -> TimeWindow {
        TimeWindow::new(lower_bound(self.from.as_deref()), cutoff(self.to.as_deref()))
    }
}

/// Unparseable cutoffs fall back to "now".
fn cutoff(raw: Option<&str>) -> Option<Timestamp> {
    let raw = raw?;
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        tracing::debug!(to = raw, "Unparseable cutoff, using now");
    }
    parsed
}

/// Unparseable lower bounds are dropped.
fn lower_bound(raw: Option<&str>) -> Option<Timestamp> {
    let raw = raw?;
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        tracing::warn!(from = raw, "Ignoring unparseable 'from' parameter");
    }
    parsed
}

/// Stock per SKU as of `to`
pub async fn get_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<DataEnvelope<Vec<AvailabilityRecord>>>> {
    let service = AvailabilityService::new(state.store);
    let items = service
        .available_items(cutoff(query.to.as_deref()))
        .await?;
    Ok(Json(DataEnvelope::new(items)))
}

/// Sales that were out of stock or sold at a loss
pub async fn get_issues(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<DataEnvelope<Vec<IssueView>>>> {
    let window = query.window();

    let service = AvailabilityService::new(state.store);
    let issues = service.issues(window.from, window.to).await?;
    Ok(Json(DataEnvelope::new(issues)))
}

/// Profit over a window (not implemented)
pub async fn get_profit(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<DataEnvelope<rust_decimal::Decimal>>> {
    let service = AvailabilityService::new(state.store);
    let profit = service.profit(query.window()).await?;
    Ok(Json(DataEnvelope::new(profit)))
}
