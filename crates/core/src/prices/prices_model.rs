use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{Result, ValidationError};

/// Canonical form of a ticker symbol. Ticker identity is case-insensitive only;
/// surrounding whitespace is stripped by input validation, not here.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.to_uppercase()
}

/// Latest known local-market price of a CEDEAR.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CedearPriceRecord {
    pub ticker: String,
    pub price_ars: Decimal,
    pub as_of: DateTime<Utc>,
    pub source: String,
    pub is_manual: bool,
}

impl CedearPriceRecord {
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(ValidationError::MissingField("ticker".to_string()).into());
        }
        if self.source.trim().is_empty() {
            return Err(ValidationError::MissingField("source".to_string()).into());
        }
        if self.price_ars <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Price for {} must be positive, got {}",
                self.ticker, self.price_ars
            ))
            .into());
        }
        Ok(())
    }
}

/// Current price per ticker, looked up case-insensitively.
///
/// Serialized as a list of records; reading one back goes through `from_records`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(
    try_from = "Vec<CedearPriceRecord>",
    into = "Vec<CedearPriceRecord>"
)]
pub struct CurrentPrices {
    by_ticker: HashMap<String, CedearPriceRecord>,
}

impl CurrentPrices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict construction: every ticker may appear only once.
    pub fn from_records(records: impl IntoIterator<Item = CedearPriceRecord>) -> Result<Self> {
        let mut prices = CurrentPrices::new();
        for record in records {
            let key = normalize_ticker(&record.ticker);
            if prices.by_ticker.contains_key(&key) {
                return Err(ValidationError::DuplicateTicker(record.ticker).into());
            }
            prices.by_ticker.insert(key, record);
        }
        Ok(prices)
    }

    /// Keeps the most recently retrieved price of each ticker.
    pub fn latest_by_ticker(records: impl IntoIterator<Item = CedearPriceRecord>) -> Self {
        let mut prices = CurrentPrices::new();
        for record in records {
            prices.insert_if_newer(record);
        }
        prices
    }

    fn insert_if_newer(&mut self, record: CedearPriceRecord) {
        let key = normalize_ticker(&record.ticker);
        match self.by_ticker.get(&key) {
            Some(existing) if existing.as_of >= record.as_of => {}
            _ => {
                self.by_ticker.insert(key, record);
            }
        }
    }

    pub fn get(&self, ticker: &str) -> Option<&CedearPriceRecord> {
        self.by_ticker.get(&normalize_ticker(ticker))
    }

    pub fn len(&self) -> usize {
        self.by_ticker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ticker.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &CedearPriceRecord> {
        self.by_ticker.values()
    }

    /// Drops prices of tickers the predicate rejects.
    pub fn retain_tickers(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.by_ticker.retain(|key, _| keep(key));
    }
}

impl TryFrom<Vec<CedearPriceRecord>> for CurrentPrices {
    type Error = crate::Error;

    fn try_from(records: Vec<CedearPriceRecord>) -> Result<Self> {
        CurrentPrices::from_records(records)
    }
}

impl From<CurrentPrices> for Vec<CedearPriceRecord> {
    fn from(prices: CurrentPrices) -> Self {
        let mut records: Vec<CedearPriceRecord> = prices.by_ticker.into_values().collect();
        records.sort_by_cached_key(|record| normalize_ticker(&record.ticker));
        records
    }
}
