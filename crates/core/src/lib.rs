//! Cedear Ledger Core - cost aggregation and MEP/CCL valuation for CEDEAR portfolios.
//!
//! The calculation engine in [`portfolio::summary`] is a pure function of its inputs.
//! The surrounding modules define the records it consumes, the helpers that assemble
//! them from storage, and the repository traits a storage layer implements.

pub mod constants;
pub mod errors;
pub mod fx;
pub mod operations;
pub mod portfolio;
pub mod prices;

pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
