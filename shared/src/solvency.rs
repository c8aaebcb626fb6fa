//! Write-time solvency check for incoming sales
//!
//! Advisory only. It compares the sale against the aggregate availability at
//! the sale's time instead of running the FIFO match, so its verdict can differ
//! from the issues computed later by [`crate::availability::compute`].

use rust_decimal::Decimal;

use crate::models::{AvailabilityRecord, NewTransaction};

/// Verdict for one incoming sale
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleAssessment {
    Sufficient,
    InsufficientQuantity { requested: i64, available: i64 },
    /// Proceeds exceed the aggregate cost basis of the available stock
    InsufficientPrice { proceeds: Decimal, cost: Decimal },
}

impl SaleAssessment {
    pub fn is_sufficient(&self) -> bool {
        matches!(self, SaleAssessment::Sufficient)
    }
}

/// Classify `sale` against `available` (`None` means nothing in stock).
pub fn assess_sale(available: Option<&AvailabilityRecord>, sale: &NewTransaction) -> SaleAssessment {
    let (qty, cost) = available.map_or((0, Decimal::ZERO), |record| (record.qty, record.cost));

    if sale.qty > qty {
        return SaleAssessment::InsufficientQuantity {
            requested: sale.qty,
            available: qty,
        };
    }

    let proceeds = sale.amount();
    if proceeds > cost {
        return SaleAssessment::InsufficientPrice { proceeds, cost };
    }

    SaleAssessment::Sufficient
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_timestamp;

    fn record(qty: i64, cost: i64) -> AvailabilityRecord {
        AvailabilityRecord {
            sku: "A".to_string(),
            qty,
            cost: Decimal::from(cost),
        }
    }

    fn sale(qty: i64, price: i64) -> NewTransaction {
        let when = parse_timestamp("2024-10-29T19:45:00").unwrap();
        NewTransaction::sale("A", qty, Decimal::from(price), when)
    }

    #[test]
    fn test_sufficient() {
        assert!(assess_sale(Some(&record(4, 410)), &sale(3, 120)).is_sufficient());
    }

    #[test]
    fn test_unknown_sku_is_insufficient_quantity() {
        assert_eq!(
            assess_sale(None, &sale(2, 150)),
            SaleAssessment::InsufficientQuantity { requested: 2, available: 0 }
        );
    }

    #[test]
    fn test_quantity_checked_before_price() {
        assert_eq!(
            assess_sale(Some(&record(1, 100)), &sale(2, 1000)),
            SaleAssessment::InsufficientQuantity { requested: 2, available: 1 }
        );
    }

    #[test]
    fn test_proceeds_above_cost_basis_is_insufficient_price() {
        assert_eq!(
            assess_sale(Some(&record(2, 200)), &sale(2, 120)),
            SaleAssessment::InsufficientPrice {
                proceeds: Decimal::from(240),
                cost: Decimal::from(200),
            }
        );
    }
}
