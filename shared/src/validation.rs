//! Validation utilities for submitted supply and sale items
//!
//! These checks belong to the request boundary. The matching engine itself is
//! permissive and never sees an item that failed here.

use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::TransactionInput;

/// Largest number of fractional digits accepted in a price
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Largest number of total digits accepted in a price
pub const PRICE_MAX_DIGITS: u32 = 10;

/// Largest quantity accepted in one item. Keeps per-SKU sums of quantity and
/// of `qty × price` far inside `i64` and `Decimal` for any realistic history.
pub const MAX_QTY: i64 = i32::MAX as i64;

// ============================================================================
// Field Validations
// ============================================================================

/// SKU must contain something other than whitespace. The value is stored as-is.
pub fn validate_sku(sku: &str) -> Result<(), ValidationError> {
    if sku.trim().is_empty() {
        return Err(error("blank_sku", "SKU must be a non-empty string"));
    }
    Ok(())
}

/// Quantity must be a whole number in `1..=MAX_QTY`.
pub fn validate_qty(qty: i64) -> Result<(), ValidationError> {
    if qty < 1 {
        return Err(error("qty_not_positive", "Quantity must be a positive integer"));
    }
    if qty > MAX_QTY {
        return Err(error(
            "qty_too_large",
            "Ensure this value is less than or equal to 2147483647",
        ));
    }
    Ok(())
}

/// Price must be non-negative and fit `NUMERIC(10, 2)`.
pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(error("negative_price", "Price must be a non-negative number"));
    }

    let normalized = price.normalize();
    if normalized.scale() > PRICE_DECIMAL_PLACES {
        return Err(error(
            "price_precision",
            "Ensure that there are no more than 2 decimal places",
        ));
    }

    let integer_digits = PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES;
    if normalized.trunc() >= Decimal::from(10_i64.pow(integer_digits)) {
        return Err(error(
            "price_digits",
            "Ensure that there are no more than 10 digits in total",
        ));
    }

    Ok(())
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

// ============================================================================
// Batch Validation
// ============================================================================

/// One failing field of one submitted item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub index: usize,
    pub field: String,
    pub message: String,
}

/// Every failure found in a submitted batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} invalid item(s) in batch", .errors.len())]
pub struct ValidationFailure {
    pub errors: Vec<ItemError>,
}

/// Validate a whole batch. Batches are all-or-nothing, so every item is
/// checked and all failures are reported together.
pub fn validate_batch(items: &[TransactionInput]) -> Result<(), ValidationFailure> {
    let errors: Vec<ItemError> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| item.validate().err().map(|errs| (index, errs)))
        .flat_map(|(index, errs)| item_errors(index, &errs))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure { errors })
    }
}

/// Deserialize and validate raw JSON items in one pass.
///
/// An item that does not deserialize (wrong type, bad timestamp, missing
/// field) is reported under the field `item`; the others are still checked so
/// the caller gets every failure at once.
pub fn parse_batch(raw: Vec<serde_json::Value>) -> Result<Vec<TransactionInput>, ValidationFailure> {
    let mut items = Vec::with_capacity(raw.len());
    let mut errors = Vec::new();

    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<TransactionInput>(value) {
            Ok(item) => {
                if let Err(errs) = item.validate() {
                    errors.extend(item_errors(index, &errs));
                }
                items.push(item);
            }
            Err(err) => errors.push(ItemError {
                index,
                field: "item".to_string(),
                message: err.to_string(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(items)
    } else {
        Err(ValidationFailure { errors })
    }
}

fn item_errors(index: usize, errors: &ValidationErrors) -> Vec<ItemError> {
    let mut out: Vec<ItemError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| ItemError {
                index,
                field: field.to_string(),
                message: err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string()),
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}
