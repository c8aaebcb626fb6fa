//! Shared types, models and the FIFO valuation engine for the stock ledger
//!
//! This crate has no I/O. It is used by the backend server and, through the
//! WASM module, by browser clients that compute availability offline.

pub mod availability;
pub mod ledger;
pub mod matching;
pub mod models;
pub mod solvency;
pub mod types;
pub mod validation;

pub use availability::*;
pub use models::*;
pub use types::*;
pub use validation::*;
