//! FIFO matching engine
//!
//! Consumes one SKU's sales against that SKU's lot queue, oldest lot first.
//!
//! Rules per sale, in chronological order:
//! - `qty == 0`: no effect, no issue.
//! - total remaining qty below the sale qty, or no open lot: [`IssueReason::OutOfStock`];
//!   the sale is rejected and no lot is touched.
//! - otherwise lots are consumed front to back. If the matched cost exceeds the
//!   proceeds the sale is flagged [`IssueReason::NegativeMargin`] but stays applied.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use crate::ledger::{Lot, SkuLedger};
use crate::models::{AvailabilityRecord, Issue, IssueReason, Transaction};

/// What one SKU looks like after all its sales were matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuOutcome {
    pub record: AvailabilityRecord,
    /// Lots still open, oldest first
    pub open_lots: VecDeque<Lot>,
    /// Flagged sales in chronological order
    pub issues: Vec<Issue>,
}

/// Result of matching a single sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleMatch {
    /// Nothing to match
    Empty,
    Rejected,
    Matched { cost: Decimal },
}

/// Match every sale of one SKU against its lots.
pub fn match_sku(sku: &str, mut ledger: SkuLedger) -> SkuOutcome {
    ledger.lots.retain(|lot| lot.qty_remaining > 0);

    let mut qty = ledger.total_qty();
    let mut cost = ledger.total_cost();
    let SkuLedger { mut lots, sales } = ledger;
    let mut issues = Vec::new();

    for sale in sales {
        match match_sale(&mut lots, qty, &sale) {
            SaleMatch::Empty => {}
            SaleMatch::Rejected => issues.push(Issue::out_of_stock(sale)),
            SaleMatch::Matched { cost: matched } => {
                qty = qty.saturating_sub(sale.qty);
                cost = cost.saturating_sub(matched);
                if matched > sale.amount() {
                    issues.push(Issue::negative_margin(sale));
                }
            }
        }
    }

    SkuOutcome {
        record: AvailabilityRecord {
            sku: sku.to_string(),
            qty,
            cost,
        },
        open_lots: lots,
        issues,
    }
}

/// Apply one sale to the lot queue. `available` is the queue's total qty.
pub fn match_sale(lots: &mut VecDeque<Lot>, available: i64, sale: &Transaction) -> SaleMatch {
    if sale.qty <= 0 {
        return SaleMatch::Empty;
    }
    if available < sale.qty || lots.is_empty() {
        return SaleMatch::Rejected;
    }
    SaleMatch::Matched {
        cost: consume_fifo(lots, sale.qty),
    }
}

/// Take `qty` units from the front of the queue and return their cost.
///
/// Exhausted lots are popped; a partially consumed lot stays at the head.
/// Cost arithmetic saturates instead of overflowing.
/// Caller guarantees the queue holds at least `qty` units.
fn consume_fifo(lots: &mut VecDeque<Lot>, qty: i64) -> Decimal {
    let mut needed = qty;
    let mut matched = Decimal::ZERO;

    while needed > 0 {
        let Some(lot) = lots.front_mut() else {
            break;
        };

        let take = lot.qty_remaining.min(needed);
        matched = matched.saturating_add(Decimal::from(take).saturating_mul(lot.unit_price));
        lot.qty_remaining -= take;
        needed -= take;

        if lot.qty_remaining == 0 {
            lots.pop_front();
        }
    }

    matched
}

impl SkuOutcome {
    pub fn has_stock(&self) -> bool {
        self.record.qty > 0
    }

    pub fn issue_count(&self, reason: IssueReason) -> usize {
        self.issues.iter().filter(|issue| issue.reason == reason).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LotLedger;
    use crate::models::NewTransaction;
    use crate::types::{parse_timestamp, Timestamp};

    fn at(s: &str) -> Timestamp {
        parse_timestamp(s).unwrap()
    }

    fn book(txs: Vec<NewTransaction>) -> SkuLedger {
        let sku = txs[0].sku.clone();
        let txs = txs
            .into_iter()
            .enumerate()
            .map(|(i, tx)| tx.into_transaction(i as i64 + 1));
        LotLedger::build(txs, at("2100-01-01T00:00:00"))
            .into_iter()
            .find(|(s, _)| *s == sku)
            .map(|(_, book)| book)
            .unwrap()
    }

    fn supply(sku: &str, qty: i64, price: i64, when: &str) -> NewTransaction {
        NewTransaction::supply(sku, qty, Decimal::from(price), at(when))
    }

    fn sale(sku: &str, qty: i64, price: i64, when: &str) -> NewTransaction {
        NewTransaction::sale(sku, qty, Decimal::from(price), at(when))
    }

    #[test]
    fn test_fifo_consumes_oldest_lot_first() {
        let outcome = match_sku(
            "A",
            book(vec![
                supply("A", 2, 100, "2024-10-28T17:41:38"),
                supply("A", 2, 105, "2024-10-29T12:22:11"),
                sale("A", 3, 120, "2024-10-29T19:45:00"),
            ]),
        );

        assert_eq!(outcome.record.qty, 1);
        assert_eq!(outcome.record.cost, Decimal::from(105));
        assert_eq!(outcome.open_lots.len(), 1);
        assert_eq!(outcome.open_lots[0].supply_id, 2);
        assert_eq!(outcome.open_lots[0].qty_remaining, 1);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_partial_lot_stays_at_head() {
        let outcome = match_sku(
            "B",
            book(vec![
                supply("B", 5, 110, "2024-10-29T12:22:11"),
                supply("B", 5, 115, "2024-10-29T12:33:33"),
                sale("B", 3, 125, "2024-10-29T19:45:01"),
                sale("B", 4, 125, "2024-10-29T19:46:01"),
            ]),
        );

        // 3@110, then 2@110 + 2@115; left 3@115
        assert_eq!(outcome.record.qty, 3);
        assert_eq!(outcome.record.cost, Decimal::from(345));
        assert_eq!(outcome.open_lots[0].supply_id, 2);
    }

    #[test]
    fn test_out_of_stock_leaves_lots_untouched() {
        let outcome = match_sku(
            "A",
            book(vec![
                supply("A", 2, 100, "2024-10-28T17:41:38"),
                sale("A", 10, 120, "2024-10-30T10:00:00"),
                sale("A", 1, 120, "2024-10-30T11:00:00"),
            ]),
        );

        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].reason, IssueReason::OutOfStock);
        assert_eq!(outcome.issues[0].transaction.qty, 10);
        // later, smaller sale still matches
        assert_eq!(outcome.record.qty, 1);
        assert_eq!(outcome.record.cost, Decimal::from(100));
    }

    #[test]
    fn test_negative_margin_still_depletes_stock() {
        let outcome = match_sku(
            "X",
            book(vec![
                supply("X", 5, 100, "2024-11-01T09:00:00"),
                sale("X", 5, 80, "2024-11-01T10:00:00"),
            ]),
        );

        assert_eq!(outcome.record.qty, 0);
        assert_eq!(outcome.record.cost, Decimal::ZERO);
        assert!(outcome.open_lots.is_empty());
        assert_eq!(outcome.issue_count(IssueReason::NegativeMargin), 1);
        assert!(!outcome.has_stock());
    }

    #[test]
    fn test_break_even_sale_is_not_flagged() {
        let outcome = match_sku(
            "X",
            book(vec![
                supply("X", 2, 100, "2024-11-01T09:00:00"),
                sale("X", 2, 100, "2024-11-01T10:00:00"),
            ]),
        );

        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_zero_quantity_events_have_no_effect() {
        let outcome = match_sku(
            "E",
            book(vec![
                supply("E", 0, 100, "2024-10-31T12:00:00"),
                sale("E", 0, 150, "2024-10-31T12:05:00"),
            ]),
        );

        assert_eq!(outcome.record.qty, 0);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_sale_without_supplies_is_out_of_stock() {
        let outcome = match_sku("C", book(vec![sale("C", 2, 150, "2024-10-29T19:45:21")]));

        assert_eq!(outcome.issue_count(IssueReason::OutOfStock), 1);
        assert_eq!(outcome.record, AvailabilityRecord::empty("C"));
    }

    #[test]
    fn test_zero_lot_does_not_satisfy_sale() {
        let outcome = match_sku(
            "E",
            book(vec![
                supply("E", 0, 100, "2024-10-31T12:00:00"),
                sale("E", 1, 150, "2024-10-31T12:05:00"),
            ]),
        );

        assert_eq!(outcome.issue_count(IssueReason::OutOfStock), 1);
    }

    #[test]
    fn test_huge_quantities_saturate_instead_of_overflowing() {
        let outcome = match_sku(
            "A",
            book(vec![
                NewTransaction::supply("A", 5_000_000_000_000_000_000, Decimal::ONE, at("2024-10-28T12:00:00")),
                NewTransaction::supply("A", 5_000_000_000_000_000_000, Decimal::ONE, at("2024-10-28T13:00:00")),
                NewTransaction::sale("A", 1, Decimal::from(2), at("2024-10-29T12:00:00")),
            ]),
        );

        assert_eq!(outcome.record.qty, i64::MAX - 1);
        assert!(outcome.has_stock());
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.open_lots.len(), 2);
    }

    #[test]
    fn test_huge_costs_saturate_instead_of_panicking() {
        let price = Decimal::new(9_999_999_999, 2);
        let outcome = match_sku(
            "A",
            book(
                (0..100)
                    .map(|_| NewTransaction::supply("A", i64::MAX, price, at("2024-10-28T12:00:00")))
                    .collect(),
            ),
        );

        assert_eq!(outcome.record.cost, Decimal::MAX);
        assert_eq!(outcome.record.qty, i64::MAX);
    }

    #[test]
    fn test_fractional_prices_are_exact() {
        let mut lots = VecDeque::from(vec![
            Lot { supply_id: 1, qty_remaining: 3, unit_price: Decimal::new(10, 2) },
            Lot { supply_id: 2, qty_remaining: 3, unit_price: Decimal::new(20, 2) },
        ]);
        let tx = sale("F", 4, 1, "2024-10-31T12:05:00").into_transaction(3);

        let result = match_sale(&mut lots, 6, &tx);

        assert_eq!(result, SaleMatch::Matched { cost: Decimal::new(50, 2) });
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].qty_remaining, 2);
    }
}
