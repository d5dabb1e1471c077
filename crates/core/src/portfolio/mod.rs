pub mod summary;
pub mod valuation;
