//! Core error types for the Cedear Ledger.
//!
//! The calculation engine never fails: missing inputs surface as absent values and
//! `is_complete` flags. These errors belong to the layers around it (input validation,
//! request assembly, and the summary service).

use thiserror::Error;
use uuid::Uuid;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the ledger.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Portfolio {0} not found")]
    PortfolioNotFound(Uuid),

    #[error("Repository error: {0}")]
    Repository(String),
}

/// Validation errors for caller-supplied records.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Ticker '{0}' appears more than once")]
    DuplicateTicker(String),

    #[error("Calculation request has no operations")]
    EmptyOperations,
}
