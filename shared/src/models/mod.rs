//! Domain models for the stock ledger

mod inventory;
mod transaction;

pub use inventory::*;
pub use transaction::*;
