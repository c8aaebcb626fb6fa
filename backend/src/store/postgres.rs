use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{NewTransaction, Transaction, TransactionKind};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, QueryBuilder};
use std::time::Duration;

use crate::config::DatabaseConfig;

use super::{EventStore, StoreError, StoreResult, TransactionFilter};

const SELECT_COLUMNS: &str = "id, transaction_type, sku, qty, price, occurred_at";

/// PostgreSQL-backed event store (table `transactions`)
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

/// Row as stored in `transactions`
#[derive(Debug, FromRow)]
struct TransactionRow {
    id: i64,
    transaction_type: String,
    sku: String,
    qty: i64,
    price: Decimal,
    occurred_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let kind = row
            .transaction_type
            .parse::<TransactionKind>()
            .map_err(|err| StoreError::CorruptRow {
                id: row.id,
                reason: err.to_string(),
            })?;

        Ok(Transaction {
            id: row.id,
            kind,
            sku: row.sku,
            qty: row.qty,
            price: row.price,
            when: row.occurred_at,
        })
    }
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool for `config`
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Apply pending migrations from `migrations/`
    pub async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn insert_sql() -> String {
        format!(
            "INSERT INTO transactions (transaction_type, sku, qty, price, occurred_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SELECT_COLUMNS}"
        )
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn append(&self, tx: NewTransaction) -> StoreResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(&Self::insert_sql())
            .bind(tx.kind.as_str())
            .bind(&tx.sku)
            .bind(tx.qty)
            .bind(tx.price)
            .bind(tx.when)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn append_all(&self, txs: Vec<NewTransaction>) -> StoreResult<Vec<Transaction>> {
        let sql = Self::insert_sql();
        let mut db_tx = self.pool.begin().await?;
        let mut committed = Vec::with_capacity(txs.len());

        for tx in txs {
            let row = sqlx::query_as::<_, TransactionRow>(&sql)
                .bind(tx.kind.as_str())
                .bind(&tx.sku)
                .bind(tx.qty)
                .bind(tx.price)
                .bind(tx.when)
                .fetch_one(&mut *db_tx)
                .await?;
            committed.push(Transaction::try_from(row)?);
        }

        db_tx.commit().await?;
        Ok(committed)
    }

    async fn query(&self, filter: TransactionFilter) -> StoreResult<Vec<Transaction>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SELECT_COLUMNS} FROM transactions WHERE TRUE"));

        if let Some(kind) = filter.kind {
            builder.push(" AND transaction_type = ").push_bind(kind.as_str());
        }
        if let Some(from) = filter.window.from {
            builder.push(" AND occurred_at >= ").push_bind(from);
        }
        if let Some(to) = filter.window.to {
            builder.push(" AND occurred_at <= ").push_bind(to);
        }
        builder.push(" ORDER BY occurred_at ASC, id ASC");

        let rows = builder
            .build_query_as::<TransactionRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn delete_all(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM transactions")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::parse_timestamp;

    fn row(transaction_type: &str) -> TransactionRow {
        TransactionRow {
            id: 42,
            transaction_type: transaction_type.to_string(),
            sku: "A".to_string(),
            qty: 2,
            price: Decimal::from(100),
            occurred_at: parse_timestamp("2024-10-28T17:41:38").unwrap(),
        }
    }

    #[test]
    fn test_row_converts_to_transaction() {
        let tx = Transaction::try_from(row("supply")).unwrap();
        assert_eq!(tx.id, 42);
        assert_eq!(tx.kind, TransactionKind::Supply);
        assert_eq!(tx.amount(), Decimal::from(200));
    }

    #[test]
    fn test_unknown_type_is_corrupt_row() {
        let err = Transaction::try_from(row("refund")).unwrap_err();
        assert!(matches!(err, StoreError::CorruptRow { id: 42, .. }));
    }
}
