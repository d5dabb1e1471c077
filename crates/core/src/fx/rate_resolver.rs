use chrono::NaiveDate;
use log::debug;

use super::fx_model::{FxRateRecord, HistoricalRates};

/// Finds the quote that applies to a trade on `trade_date`.
///
/// Policy: the quote for the trade date itself, otherwise the nearest earlier quote in
/// the history. Whichever entry is found first must be a sell rate; a buy rate ends the
/// search with no result instead of falling back further. Later dates are never used.
pub fn find_historical_rate(
    trade_date: NaiveDate,
    rates: &HistoricalRates,
) -> Option<&FxRateRecord> {
    if rates.is_empty() {
        return None;
    }

    let candidate = match rates.get(&trade_date) {
        Some(exact) => exact,
        // Bounded by the earliest key; no calendar walk.
        None => rates.range(..trade_date).next_back().map(|(_, rate)| rate)?,
    };

    if candidate.is_sell_rate {
        Some(candidate)
    } else {
        debug!(
            "Nearest {} quote for {} is a buy rate ({}); no historical rate applied.",
            candidate.rate_type, trade_date, candidate.rate_date
        );
        None
    }
}
