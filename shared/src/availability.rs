//! Availability computation
//!
//! One pass builds the lot ledger for a cutoff and matches every SKU. The
//! resulting [`ComputationResult`] is immutable and serves both the
//! "available items" and the "issues" views, so asking for both never
//! recomputes.

use crate::ledger::LotLedger;
use crate::matching::match_sku;
use crate::models::{AvailabilityRecord, Issue, Transaction};
use crate::types::Timestamp;

/// Everything derived from the transactions up to one cutoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputationResult {
    cutoff: Timestamp,
    /// SKUs with stock left, in order of first appearance
    records: Vec<AvailabilityRecord>,
    /// Flagged sales ordered by `(when, id)`
    issues: Vec<Issue>,
}

/// Run the lot ledger and matching engine for `cutoff`.
pub fn compute<I>(transactions: I, cutoff: Timestamp) -> ComputationResult
where
    I: IntoIterator<Item = Transaction>,
{
    let ledger = LotLedger::build(transactions, cutoff);

    let mut records = Vec::new();
    let mut issues = Vec::new();

    for (sku, book) in ledger {
        let outcome = match_sku(&sku, book);
        if outcome.has_stock() {
            records.push(outcome.record);
        }
        issues.extend(outcome.issues);
    }

    issues.sort_by_key(|issue| issue.transaction.ordering_key());

    ComputationResult {
        cutoff,
        records,
        issues,
    }
}

impl ComputationResult {
    pub fn cutoff(&self) -> Timestamp {
        self.cutoff
    }

    /// SKUs with remaining stock. SKUs at zero are never listed.
    pub fn available_items(&self) -> &[AvailabilityRecord] {
        &self.records
    }

    /// Availability of one SKU, `None` when it has no stock.
    pub fn available(&self, sku: &str) -> Option<&AvailabilityRecord> {
        self.records.iter().find(|record| record.sku == sku)
    }

    /// Issues in chronological order, optionally only those with `when >= from`.
    pub fn issues(&self, from: Option<Timestamp>) -> impl Iterator<Item = &Issue> + '_ {
        self.issues
            .iter()
            .filter(move |issue| from.map_or(true, |from| issue.transaction.when >= from))
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    pub fn into_parts(self) -> (Vec<AvailabilityRecord>, Vec<Issue>) {
        (self.records, self.issues)
    }
}
