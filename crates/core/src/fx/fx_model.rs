use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{Result, ValidationError};

/// The two implied-dollar methodologies used to convert ARS amounts into USD.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FxRateType {
    /// "Dólar MEP": implied rate from local bond purchases settled in dollars.
    Mep,
    /// "Contado con liquidación": implied rate from cross-listed instruments.
    Ccl,
}

impl FxRateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FxRateType::Mep => "MEP",
            FxRateType::Ccl => "CCL",
        }
    }
}

impl fmt::Display for FxRateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dollar quote as observed by the ingestion layer.
///
/// Only sell-side quotes (`is_sell_rate`) may convert a value. Buy-side quotes are
/// carried for completeness but never produce a USD figure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FxRateRecord {
    pub rate_type: FxRateType,
    pub rate_value: Decimal,
    pub rate_date: NaiveDate,
    pub retrieved_at: DateTime<Utc>,
    pub source: String,
    pub is_manual: bool,
    pub is_sell_rate: bool,
}

impl FxRateRecord {
    /// Converts an ARS amount into USD at this rate.
    ///
    /// Returns `None` for buy-side quotes and for a zero rate.
    pub fn convert(&self, amount_ars: Decimal) -> Option<UsdValueWithFx> {
        if !self.is_sell_rate {
            return None;
        }
        let value = amount_ars.checked_div(self.rate_value)?;
        Some(UsdValueWithFx {
            value,
            fx_rate: self.clone(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_value <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "{} rate for {} must be positive, got {}",
                self.rate_type, self.rate_date, self.rate_value
            ))
            .into());
        }
        if self.source.trim().is_empty() {
            return Err(ValidationError::MissingField("source".to_string()).into());
        }
        Ok(())
    }
}

/// Dated history of one rate type. Ordered so the nearest earlier date is a range lookup.
pub type HistoricalRates = BTreeMap<NaiveDate, FxRateRecord>;

/// A USD amount together with the exact quote that produced it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsdValueWithFx {
    pub value: Decimal,
    pub fx_rate: FxRateRecord,
}

/// USD total for one methodology across several conversions.
///
/// `weighted_rate` is the implied rate of the whole aggregate (ARS total / USD total),
/// and `fx_rates_used` lists every quote that contributed, in contribution order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateUsdValue {
    pub fx_type: FxRateType,
    pub value: Decimal,
    pub weighted_rate: Decimal,
    pub fx_rates_used: Vec<FxRateRecord>,
}

impl AggregateUsdValue {
    /// The aggregate of nothing: zero total, zero rate, no contributing quotes.
    pub fn empty(fx_type: FxRateType) -> Self {
        AggregateUsdValue {
            fx_type,
            value: Decimal::ZERO,
            weighted_rate: Decimal::ZERO,
            fx_rates_used: Vec::new(),
        }
    }
}
