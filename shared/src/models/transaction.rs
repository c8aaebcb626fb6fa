//! Supply and sale transaction models

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::types::Timestamp;
use crate::validation::{validate_price, validate_qty, validate_sku};

/// Kind of a recorded transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Supply,
    Sale,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Supply => "supply",
            TransactionKind::Sale => "sale",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown transaction kind: {0}")]
pub struct UnknownTransactionKind(pub String);

impl FromStr for TransactionKind {
    type Err = UnknownTransactionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supply" => Ok(TransactionKind::Supply),
            "sale" => Ok(TransactionKind::Sale),
            other => Err(UnknownTransactionKind(other.to_string())),
        }
    }
}

/// An immutable, persisted supply or sale event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned insertion sequence; breaks ties between equal `when`s
    pub id: i64,
    pub kind: TransactionKind,
    /// Case-sensitive stock-keeping unit
    pub sku: String,
    pub qty: i64,
    /// Unit price
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "crate::types::timestamp")]
    pub when: Timestamp,
}

impl Transaction {
    /// `qty × price`: cost of a supply, proceeds of a sale
    pub fn amount(&self) -> Decimal {
        Decimal::from(self.qty).saturating_mul(self.price)
    }

    /// Total order over transactions: time first, then insertion order.
    pub fn ordering_key(&self) -> (Timestamp, i64) {
        (self.when, self.id)
    }

    pub fn is_supply(&self) -> bool {
        self.kind == TransactionKind::Supply
    }

    pub fn is_sale(&self) -> bool {
        self.kind == TransactionKind::Sale
    }
}

/// A validated transaction that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub sku: String,
    pub qty: i64,
    pub price: Decimal,
    pub when: Timestamp,
}

impl NewTransaction {
    pub fn supply(sku: impl Into<String>, qty: i64, price: Decimal, when: Timestamp) -> Self {
        Self {
            kind: TransactionKind::Supply,
            sku: sku.into(),
            qty,
            price,
            when,
        }
    }

    pub fn sale(sku: impl Into<String>, qty: i64, price: Decimal, when: Timestamp) -> Self {
        Self {
            kind: TransactionKind::Sale,
            sku: sku.into(),
            qty,
            price,
            when,
        }
    }

    /// Sale proceeds (or supply cost): `qty × price`
    pub fn amount(&self) -> Decimal {
        Decimal::from(self.qty).saturating_mul(self.price)
    }

    /// Attach the store-assigned id.
    pub fn into_transaction(self, id: i64) -> Transaction {
        Transaction {
            id,
            kind: self.kind,
            sku: self.sku,
            qty: self.qty,
            price: self.price,
            when: self.when,
        }
    }
}

/// A supply or sale item as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransactionInput {
    #[validate(custom = "validate_sku")]
    pub sku: String,
    #[validate(custom = "validate_qty")]
    pub qty: i64,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    #[serde(with = "crate::types::timestamp")]
    pub when: Timestamp,
}

impl TransactionInput {
    pub fn into_new(self, kind: TransactionKind) -> NewTransaction {
        NewTransaction {
            kind,
            sku: self.sku,
            qty: self.qty,
            price: self.price,
            when: self.when,
        }
    }
}
