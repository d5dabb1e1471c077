//! Builds engine inputs from the flat list of stored dollar quotes.

use super::fx_model::{FxRateRecord, FxRateType, HistoricalRates};

/// Indexes the quotes of one rate type by date.
///
/// When a date was quoted more than once, the most recently retrieved quote wins.
pub fn historical_rates_by_date(records: &[FxRateRecord], fx_type: FxRateType) -> HistoricalRates {
    let mut by_date = HistoricalRates::new();
    for record in records.iter().filter(|r| r.rate_type == fx_type) {
        match by_date.get(&record.rate_date) {
            Some(existing) if existing.retrieved_at >= record.retrieved_at => {}
            _ => {
                by_date.insert(record.rate_date, record.clone());
            }
        }
    }
    by_date
}

/// The "current" quote of one rate type: latest rate date, then latest retrieval.
pub fn latest_rate(records: &[FxRateRecord], fx_type: FxRateType) -> Option<FxRateRecord> {
    records
        .iter()
        .filter(|r| r.rate_type == fx_type)
        .max_by_key(|r| (r.rate_date, r.retrieved_at))
        .cloned()
}
