//! Business logic services for the stock ledger

pub mod availability;
pub mod ingestion;

pub use availability::AvailabilityService;
pub use ingestion::IngestionService;
