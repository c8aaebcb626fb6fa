//! WebAssembly module for the Stock Ledger
//!
//! Provides client-side computation for:
//! - Availability (remaining quantity and FIFO cost basis per SKU)
//! - Issues (out-of-stock and negative-margin sales)
//! - Offline validation of supply/sale items before submission

use rust_decimal::Decimal;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str(concat!(
        "stock-ledger-wasm ",
        env!("CARGO_PKG_VERSION")
    )));
}

/// A transaction held by the client. Ids are assigned from array position.
#[derive(Debug, Deserialize)]
struct OfflineTransaction {
    kind: TransactionKind,
    sku: String,
    qty: i64,
    price: Decimal,
    #[serde(with = "shared::types::timestamp")]
    when: Timestamp,
}

fn load_transactions(transactions_json: &str) -> Result<Vec<Transaction>, String> {
    let items: Vec<OfflineTransaction> = serde_json::from_str(transactions_json)
        .map_err(|e| format!("Invalid transactions JSON: {}", e))?;

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(i, item)| Transaction {
            id: i as i64 + 1,
            kind: item.kind,
            sku: item.sku,
            qty: item.qty,
            price: item.price,
            when: item.when,
        })
        .collect())
}

fn required_timestamp(name: &str, raw: &str) -> Result<Timestamp, String> {
    parse_timestamp(raw).ok_or_else(|| format!("Invalid {} timestamp: {}", name, raw))
}

fn availability_json(transactions_json: &str, cutoff: &str) -> Result<String, String> {
    let cutoff = required_timestamp("cutoff", cutoff)?;
    let result = shared::compute(load_transactions(transactions_json)?, cutoff);

    serde_json::to_string(result.available_items()).map_err(|e| e.to_string())
}

fn issues_json(transactions_json: &str, cutoff: &str, from: Option<String>) -> Result<String, String> {
    let cutoff = required_timestamp("cutoff", cutoff)?;
    // Unparseable lower bounds are ignored, as on the server
    let from = from.as_deref().and_then(parse_timestamp);
    let result = shared::compute(load_transactions(transactions_json)?, cutoff);

    let issues: Vec<IssueView> = result.issues(from).map(IssueView::from).collect();
    serde_json::to_string(&issues).map_err(|e| e.to_string())
}

fn item_errors_json(items_json: &str) -> Result<String, String> {
    let raw: Vec<serde_json::Value> =
        serde_json::from_str(items_json).map_err(|e| format!("Invalid items JSON: {}", e))?;

    let errors = match parse_batch(raw) {
        Ok(_) => Vec::new(),
        Err(failure) => failure.errors,
    };
    serde_json::to_string(&errors).map_err(|e| e.to_string())
}

/// Remaining stock per SKU as of `cutoff`, as a JSON array of `{sku, qty, cost}`
#[wasm_bindgen]
pub fn compute_availability(transactions_json: &str, cutoff: &str) -> Result<String, JsValue> {
    availability_json(transactions_json, cutoff).map_err(|e| JsValue::from_str(&e))
}

/// Flagged sales up to `cutoff`, optionally from `from`, as a JSON array
#[wasm_bindgen]
pub fn compute_issues(
    transactions_json: &str,
    cutoff: &str,
    from: Option<String>,
) -> Result<String, JsValue> {
    issues_json(transactions_json, cutoff, from).map_err(|e| JsValue::from_str(&e))
}

/// Validate a batch of items; returns a JSON array of `{index, field, message}`
#[wasm_bindgen]
pub fn validate_items(items_json: &str) -> Result<String, JsValue> {
    item_errors_json(items_json).map_err(|e| JsValue::from_str(&e))
}

/// Check a SKU before submission
#[wasm_bindgen]
pub fn is_valid_sku(sku: &str) -> bool {
    validate_sku(sku).is_ok()
}
