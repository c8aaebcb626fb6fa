//! HTTP handlers for the stock ledger API

pub mod availability;
pub mod health;
pub mod transactions;

pub use availability::{get_availability, get_issues, get_profit};
pub use health::health_check;
pub use transactions::{flush, record_sales, record_supplies};
