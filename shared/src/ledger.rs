//! Lot ledger: per-SKU supply lots and sales up to a cutoff
//!
//! Pure retrieval and grouping. Nothing here interprets quantities or prices
//! beyond turning each supply into a lot; matching happens in [`crate::matching`].

use std::collections::{HashMap, VecDeque};

use rust_decimal::Decimal;

use crate::models::{Transaction, TransactionKind};
use crate::types::Timestamp;

/// Remaining part of one supply transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    /// Id of the supply transaction this lot came from
    pub supply_id: i64,
    pub qty_remaining: i64,
    pub unit_price: Decimal,
}

impl Lot {
    pub fn from_supply(supply: &Transaction) -> Self {
        Self {
            supply_id: supply.id,
            qty_remaining: supply.qty,
            unit_price: supply.price,
        }
    }

    /// Cost basis of what is left in this lot. Saturates at `Decimal::MAX`.
    pub fn cost(&self) -> Decimal {
        Decimal::from(self.qty_remaining).saturating_mul(self.unit_price)
    }
}

/// Lots (oldest first) and sales (chronological) of a single SKU
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkuLedger {
    pub lots: VecDeque<Lot>,
    pub sales: Vec<Transaction>,
}

impl SkuLedger {
    pub fn total_qty(&self) -> i64 {
        self.lots
            .iter()
            .fold(0i64, |total, lot| total.saturating_add(lot.qty_remaining))
    }

    pub fn total_cost(&self) -> Decimal {
        self.lots
            .iter()
            .fold(Decimal::ZERO, |total, lot| total.saturating_add(lot.cost()))
    }
}

/// All SKU ledgers for one cutoff, in order of each SKU's first transaction
#[derive(Debug, Clone, Default)]
pub struct LotLedger {
    index: HashMap<String, usize>,
    entries: Vec<(String, SkuLedger)>,
}

impl LotLedger {
    /// Group transactions with `when <= cutoff` by SKU.
    ///
    /// Input order does not matter: transactions are sorted by `(when, id)`
    /// before grouping, so equal timestamps keep insertion order.
    pub fn build<I>(transactions: I, cutoff: Timestamp) -> Self
    where
        I: IntoIterator<Item = Transaction>,
    {
        let mut ordered: Vec<Transaction> = transactions
            .into_iter()
            .filter(|tx| tx.when <= cutoff)
            .collect();
        ordered.sort_by_key(Transaction::ordering_key);

        let mut ledger = Self::default();

        for tx in ordered {
            let book = ledger.book_mut(&tx.sku);
            match tx.kind {
                TransactionKind::Supply => book.lots.push_back(Lot::from_supply(&tx)),
                TransactionKind::Sale => book.sales.push(tx),
            }
        }

        ledger
    }

    fn book_mut(&mut self, sku: &str) -> &mut SkuLedger {
        let idx = match self.index.get(sku) {
            Some(&idx) => idx,
            None => {
                self.entries.push((sku.to_string(), SkuLedger::default()));
                let idx = self.entries.len() - 1;
                self.index.insert(sku.to_string(), idx);
                idx
            }
        };
        &mut self.entries[idx].1
    }

    pub fn get(&self, sku: &str) -> Option<&SkuLedger> {
        self.index.get(sku).map(|&idx| &self.entries[idx].1)
    }

    pub fn skus(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(sku, _)| sku.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for LotLedger {
    type Item = (String, SkuLedger);
    type IntoIter = std::vec::IntoIter<(String, SkuLedger)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
