//! Availability service: derives stock levels and issues from the event store

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use shared::{
    availability, AvailabilityRecord, ComputationResult, IssueView, TimeWindow, Timestamp,
};

use crate::error::{AppError, AppResult};
use crate::store::{EventStore, TransactionFilter};

/// Read side of the ledger
#[derive(Clone)]
pub struct AvailabilityService {
    store: Arc<dyn EventStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Load every transaction with `when <= cutoff` and run the matching engine once.
    ///
    /// Both [`ComputationResult::available_items`] and [`ComputationResult::issues`]
    /// are projections of the returned value.
    pub async fn compute(&self, cutoff: Timestamp) -> AppResult<ComputationResult> {
        let transactions = self.store.query(TransactionFilter::until(cutoff)).await?;
        let loaded = transactions.len();

        let result = availability::compute(transactions, cutoff);

        tracing::debug!(
            cutoff = %cutoff,
            transactions = loaded,
            available_skus = result.available_items().len(),
            issues = result.issue_count(),
            "Computed availability"
        );

        Ok(result)
    }

    /// Stock per SKU as of `to` (now when absent). SKUs at zero are omitted.
    pub async fn available_items(
        &self,
        to: Option<Timestamp>,
    ) -> AppResult<Vec<AvailabilityRecord>> {
        let result = self.compute(resolve_cutoff(to)).await?;
        let (records, _) = result.into_parts();
        Ok(records)
    }

    /// Flagged sales up to `to` (now when absent), keeping those with `when >= from`.
    pub async fn issues(
        &self,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
    ) -> AppResult<Vec<IssueView>> {
        let result = self.compute(resolve_cutoff(to)).await?;
        Ok(result.issues(from).map(IssueView::from).collect())
    }

    /// Realised profit over a window. Never implemented upstream; kept as an entry point.
    pub async fn profit(&self, _window: TimeWindow) -> AppResult<Decimal> {
        Err(AppError::NotImplemented("Profit reporting".to_string()))
    }
}

/// Missing cutoffs mean "now".
pub fn resolve_cutoff(to: Option<Timestamp>) -> Timestamp {
    to.unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryEventStore;
    use shared::{parse_timestamp, IssueReason, NewTransaction};

    fn at(s: &str) -> Timestamp {
        parse_timestamp(s).unwrap()
    }

    async fn seeded() -> AvailabilityService {
        let store = Arc::new(InMemoryEventStore::new());
        store
            .append_all(vec![
                NewTransaction::supply("A", 2, Decimal::from(100), at("2024-10-28T17:41:38")),
                NewTransaction::supply("A", 2, Decimal::from(105), at("2024-10-29T12:22:11")),
                NewTransaction::sale("A", 3, Decimal::from(120), at("2024-10-29T19:45:00")),
                NewTransaction::sale("C", 2, Decimal::from(150), at("2024-10-29T19:45:21")),
            ])
            .await
            .unwrap();
        AvailabilityService::new(store)
    }

    #[tokio::test]
    async fn test_available_items_defaults_to_now() {
        let service = seeded().await;
        let items = service.available_items(None).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].sku, "A");
        assert_eq!(items[0].qty, 1);
        assert_eq!(items[0].cost, Decimal::from(105));
    }

    #[tokio::test]
    async fn test_cutoff_excludes_later_transactions() {
        let service = seeded().await;
        let items = service
            .available_items(Some(at("2024-10-28T17:41:38")))
            .await
            .unwrap();

        assert_eq!(items[0].qty, 2);
        assert_eq!(items[0].cost, Decimal::from(200));
    }

    #[tokio::test]
    async fn test_issues_window() {
        let service = seeded().await;

        let all = service.issues(None, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].sku, "C");
        assert_eq!(all[0].message, IssueReason::OutOfStock);

        let before_sale = service
            .issues(None, Some(at("2024-10-29T19:45:20")))
            .await
            .unwrap();
        assert!(before_sale.is_empty());

        let after_sale = service
            .issues(Some(at("2024-10-29T19:45:22")), None)
            .await
            .unwrap();
        assert!(after_sale.is_empty());
    }

    #[tokio::test]
    async fn test_profit_is_not_implemented() {
        let service = seeded().await;
        let err = service.profit(TimeWindow::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NotImplemented(_)));
    }
}
