//! FX module - dollar quote models, historical resolution, and input assembly.

mod fx_history;
mod fx_model;
mod rate_resolver;

pub use fx_history::{historical_rates_by_date, latest_rate};
pub use fx_model::{AggregateUsdValue, FxRateRecord, FxRateType, HistoricalRates, UsdValueWithFx};
pub use rate_resolver::find_historical_rate;
