//! Event store: durable, append-only record of supply and sale transactions
//!
//! Reads are always ordered by `(when, id)`, which is the total order the
//! matching engine relies on.

use async_trait::async_trait;
use shared::{NewTransaction, TimeWindow, Timestamp, Transaction, TransactionKind};
use thiserror::Error;

mod memory;
mod postgres;

pub use memory::InMemoryEventStore;
pub use postgres::PgEventStore;

/// Event store operation error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt row {id}: {reason}")]
    CorruptRow { id: i64, reason: String },

    #[error("store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Selection of transactions for [`EventStore::query`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// `None` matches both kinds
    pub kind: Option<TransactionKind>,
    pub window: TimeWindow,
}

impl TransactionFilter {
    #[cfg(test)]
    pub fn all() -> Self {
        Self::default()
    }

    /// Everything with `when <= to`
    pub fn until(to: Timestamp) -> Self {
        Self {
            kind: None,
            window: TimeWindow::until(to),
        }
    }

    #[cfg(test)]
    pub fn of_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.kind.map_or(true, |kind| tx.kind == kind) && self.window.contains(&tx.when)
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one transaction and return it with its assigned id.
    async fn append(&self, tx: NewTransaction) -> StoreResult<Transaction>;

    /// Append a batch. Either every item is stored or none is.
    async fn append_all(&self, txs: Vec<NewTransaction>) -> StoreResult<Vec<Transaction>>;

    /// Matching transactions ordered by `when` ascending, ties by insertion order.
    async fn query(&self, filter: TransactionFilter) -> StoreResult<Vec<Transaction>>;

    /// Remove every transaction. Returns how many were removed.
    async fn delete_all(&self) -> StoreResult<u64>;

    async fn ping(&self) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::parse_timestamp;

    #[test]
    fn test_filter_matches_kind_and_window() {
        let when = parse_timestamp("2024-10-29T12:00:00").unwrap();
        let tx = NewTransaction::sale("A", 1, Decimal::ONE, when).into_transaction(1);

        assert!(TransactionFilter::all().matches(&tx));
        assert!(TransactionFilter::until(when).matches(&tx));
        assert!(!TransactionFilter::all()
            .of_kind(TransactionKind::Supply)
            .matches(&tx));
        assert!(!TransactionFilter::until(parse_timestamp("2024-10-29T11:59:59").unwrap())
            .matches(&tx));
    }
}
