use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use shared::{NewTransaction, Transaction};

use super::{EventStore, StoreError, StoreResult, TransactionFilter};

/// In-memory append-only event store.
///
/// Intended for tests/dev. Not optimized for performance. Ids keep counting
/// after `delete_all`, like a database sequence.
#[derive(Debug)]
pub struct InMemoryEventStore {
    rows: RwLock<Vec<Transaction>>,
    next_id: AtomicI64,
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, tx: NewTransaction) -> StoreResult<Transaction> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        let stored = tx.into_transaction(self.next_id());
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn append_all(&self, txs: Vec<NewTransaction>) -> StoreResult<Vec<Transaction>> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;

        let committed: Vec<Transaction> = txs
            .into_iter()
            .map(|tx| tx.into_transaction(self.next_id()))
            .collect();
        rows.extend(committed.iter().cloned());

        Ok(committed)
    }

    async fn query(&self, filter: TransactionFilter) -> StoreResult<Vec<Transaction>> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;

        let mut matching: Vec<Transaction> =
            rows.iter().filter(|tx| filter.matches(tx)).cloned().collect();
        matching.sort_by_key(Transaction::ordering_key);

        Ok(matching)
    }

    async fn delete_all(&self) -> StoreResult<u64> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        let deleted = rows.len() as u64;
        rows.clear();
        Ok(deleted)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.rows.read().map(|_| ()).map_err(|_| StoreError::Poisoned)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::{parse_timestamp, TransactionKind};

    fn sale(sku: &str, when: &str) -> NewTransaction {
        NewTransaction::sale(sku, 1, Decimal::from(10), parse_timestamp(when).unwrap())
    }

    fn supply(sku: &str, when: &str) -> NewTransaction {
        NewTransaction::supply(sku, 1, Decimal::from(10), parse_timestamp(when).unwrap())
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_ids() {
        let store = InMemoryEventStore::new();
        let first = store.append(supply("A", "2024-10-29T12:00:00")).await.unwrap();
        let second = store.append(supply("A", "2024-10-28T12:00:00")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_query_orders_by_when_then_id() {
        let store = InMemoryEventStore::new();
        store
            .append_all(vec![
                supply("A", "2024-10-29T12:00:00"),
                sale("A", "2024-10-28T12:00:00"),
                sale("B", "2024-10-29T12:00:00"),
            ])
            .await
            .unwrap();

        let ids: Vec<i64> = store
            .query(TransactionFilter::all())
            .await
            .unwrap()
            .iter()
            .map(|tx| tx.id)
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[tokio::test]
    async fn test_query_filters_by_kind_and_cutoff() {
        let store = InMemoryEventStore::new();
        store
            .append_all(vec![
                supply("A", "2024-10-28T12:00:00"),
                sale("A", "2024-10-29T12:00:00"),
                supply("A", "2024-10-30T12:00:00"),
            ])
            .await
            .unwrap();

        let cutoff = parse_timestamp("2024-10-29T12:00:00").unwrap();
        let supplies = store
            .query(TransactionFilter::until(cutoff).of_kind(TransactionKind::Supply))
            .await
            .unwrap();

        assert_eq!(supplies.len(), 1);
        assert_eq!(supplies[0].id, 1);
    }

    #[tokio::test]
    async fn test_delete_all_counts_and_keeps_sequence() {
        let store = InMemoryEventStore::new();
        store
            .append_all(vec![supply("A", "2024-10-28T12:00:00"), sale("A", "2024-10-29T12:00:00")])
            .await
            .unwrap();

        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert!(store.is_empty());

        let next = store.append(supply("A", "2024-10-28T12:00:00")).await.unwrap();
        assert_eq!(next.id, 3);
    }
}
