//! Ingestion service: appends supplies and sales, flags risky sales at write time

use std::sync::Arc;

use serde::Serialize;
use shared::solvency::{assess_sale, SaleAssessment};
use shared::{NewTransaction, TransactionKind};

use crate::error::{AppError, AppResult};
use crate::services::AvailabilityService;
use crate::store::EventStore;

/// Write side of the ledger
#[derive(Clone)]
pub struct IngestionService {
    store: Arc<dyn EventStore>,
    availability: AvailabilityService,
}

/// Result of a supply batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuppliesOutcome {
    pub success: usize,
}

/// Result of a sales batch. Every sale is stored; `issues` counts the flagged ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SalesOutcome {
    pub success: usize,
    pub issues: usize,
}

/// Result of a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlushOutcome {
    pub success: u64,
}

impl IngestionService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        let availability = AvailabilityService::new(store.clone());
        Self {
            store,
            availability,
        }
    }

    /// Store a batch of supplies atomically.
    pub async fn add_supplies(&self, supplies: Vec<NewTransaction>) -> AppResult<SuppliesOutcome> {
        ensure_kind(&supplies, TransactionKind::Supply)?;

        let stored = self.store.append_all(supplies).await?;
        tracing::info!(count = stored.len(), "Recorded supplies");

        Ok(SuppliesOutcome {
            success: stored.len(),
        })
    }

    /// Store each sale in order, checking it against availability at its own time.
    ///
    /// The check sees the store as it was before the sale is appended, and only
    /// compares aggregates (quantity, then proceeds against cost basis). It never
    /// blocks the write.
    pub async fn add_sales(&self, sales: Vec<NewTransaction>) -> AppResult<SalesOutcome> {
        ensure_kind(&sales, TransactionKind::Sale)?;

        let total = sales.len();
        let mut issues = 0;

        for sale in sales {
            let snapshot = self.availability.compute(sale.when).await?;
            let assessment = assess_sale(snapshot.available(&sale.sku), &sale);

            self.store.append(sale.clone()).await?;

            match assessment {
                SaleAssessment::Sufficient => {}
                SaleAssessment::InsufficientQuantity { requested, available } => {
                    tracing::error!(requested, available, "Insufficient quantity for {}", sale.sku);
                    issues += 1;
                }
                SaleAssessment::InsufficientPrice { proceeds, cost } => {
                    tracing::error!(%proceeds, %cost, "Insufficient price for {}", sale.sku);
                    issues += 1;
                }
            }
        }

        tracing::info!(count = total, issues, "Recorded sales");

        Ok(SalesOutcome {
            success: total - issues,
            issues,
        })
    }

    /// Delete every stored transaction.
    pub async fn flush(&self) -> AppResult<FlushOutcome> {
        let deleted = self.store.delete_all().await?;
        tracing::warn!(deleted, "Flushed all transactions");

        Ok(FlushOutcome { success: deleted })
    }
}

fn ensure_kind(items: &[NewTransaction], kind: TransactionKind) -> AppResult<()> {
    match items.iter().find(|item| item.kind != kind) {
        Some(item) => Err(AppError::Validation {
            field: "kind".to_string(),
            message: format!("Expected {} but got {}", kind, item.kind),
        }),
        None => Ok(()),
    }
}
