//! HTTP handlers for recording supplies and sales

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::Deserialize;
use shared::{parse_batch, DataEnvelope, NewTransaction, TransactionKind};

use crate::error::AppResult;
use crate::services::ingestion::{FlushOutcome, SalesOutcome, SuppliesOutcome};
use crate::services::IngestionService;
use crate::AppState;

/// Request body for both batch endpoints: `{"data": [items]}`
///
/// Items stay raw JSON until validation so one malformed item is reported
/// with its index instead of failing the whole body.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

impl BatchRequest {
    /// Validate every item, then tag them with `kind`. Nothing is returned unless all pass.
    fn into_validated(self, kind: TransactionKind) -> AppResult<Vec<NewTransaction>> {
        let items = parse_batch(self.data)?;
        Ok(items.into_iter().map(|item| item.into_new(kind)).collect())
    }
}

/// Record a batch of supplies
pub async fn record_supplies(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataEnvelope<SuppliesOutcome>>)> {
    let Json(request) = payload?;
    let supplies = request.into_validated(TransactionKind::Supply)?;

    let service = IngestionService::new(state.store);
    let outcome = service.add_supplies(supplies).await?;
    Ok((StatusCode::CREATED, Json(DataEnvelope::new(outcome))))
}

/// Record a batch of sales
pub async fn record_sales(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataEnvelope<SalesOutcome>>)> {
    let Json(request) = payload?;
    let sales = request.into_validated(TransactionKind::Sale)?;

    let service = IngestionService::new(state.store);
    let outcome = service.add_sales(sales).await?;
    Ok((StatusCode::CREATED, Json(DataEnvelope::new(outcome))))
}

/// Delete every transaction
pub async fn flush(State(state): State<AppState>) -> AppResult<Json<DataEnvelope<FlushOutcome>>> {
    let service = IngestionService::new(state.store);
    let outcome = service.flush().await?;
    Ok(Json(DataEnvelope::new(outcome)))
}
