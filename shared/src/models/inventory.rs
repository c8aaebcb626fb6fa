//! Derived inventory models: availability records and issues

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Transaction;
use crate::types::Timestamp;

/// Remaining quantity and cost basis of one SKU at a cutoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub sku: String,
    pub qty: i64,
    /// Sum over open lots of `qty_remaining × unit_price`
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
}

impl AvailabilityRecord {
    pub fn empty(sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            qty: 0,
            cost: Decimal::ZERO,
        }
    }
}

/// Why a sale was flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueReason {
    /// Not enough stock; the sale was not applied
    OutOfStock,
    /// Matched FIFO cost exceeds proceeds; the sale was still applied
    NegativeMargin,
}

impl IssueReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueReason::OutOfStock => "out_of_stock",
            IssueReason::NegativeMargin => "negative_margin",
        }
    }
}

impl fmt::Display for IssueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sale that could not be matched, or matched at a loss
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub transaction: Transaction,
    pub reason: IssueReason,
}

impl Issue {
    pub fn out_of_stock(transaction: Transaction) -> Self {
        Self {
            transaction,
            reason: IssueReason::OutOfStock,
        }
    }

    pub fn negative_margin(transaction: Transaction) -> Self {
        Self {
            transaction,
            reason: IssueReason::NegativeMargin,
        }
    }
}

/// Flat wire representation of an [`Issue`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueView {
    pub sku: String,
    pub qty: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "crate::types::timestamp")]
    pub when: Timestamp,
    pub message: IssueReason,
}

impl From<&Issue> for IssueView {
    fn from(issue: &Issue) -> Self {
        Self {
            sku: issue.transaction.sku.clone(),
            qty: issue.transaction.qty,
            price: issue.transaction.price,
            when: issue.transaction.when,
            message: issue.reason,
        }
    }
}

impl From<Issue> for IssueView {
    fn from(issue: Issue) -> Self {
        Self {
            sku: issue.transaction.sku,
            qty: issue.transaction.qty,
            price: issue.transaction.price,
            when: issue.transaction.when,
            message: issue.reason,
        }
    }
}
