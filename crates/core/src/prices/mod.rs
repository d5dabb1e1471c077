//! CEDEAR price models.

mod prices_model;

pub use prices_model::{normalize_ticker, CedearPriceRecord, CurrentPrices};
