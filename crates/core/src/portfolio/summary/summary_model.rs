//! Portfolio summary domain models: engine input and the output tree.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::{Result, ValidationError};
use crate::fx::{
    historical_rates_by_date, latest_rate, AggregateUsdValue, FxRateRecord, FxRateType,
    HistoricalRates, UsdValueWithFx,
};
use crate::operations::{Operation, OperationCost};
use crate::prices::{normalize_ticker, CedearPriceRecord, CurrentPrices};

/// Everything the engine needs for one calculation.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    pub operations: Vec<Operation>,
    pub current_prices: CurrentPrices,
    pub current_mep: Option<FxRateRecord>,
    pub current_ccl: Option<FxRateRecord>,
    pub historical_mep: HistoricalRates,
    pub historical_ccl: HistoricalRates,
}

impl CalculationRequest {
    /// Builds a request from flat stored records.
    ///
    /// Prices are reduced to the latest per ticker and limited to tickers that were
    /// traded. Dollar quotes are split by type into dated histories, and the current
    /// quote of each type is its latest one.
    pub fn assemble(
        operations: Vec<Operation>,
        price_records: Vec<CedearPriceRecord>,
        rate_records: &[FxRateRecord],
    ) -> Self {
        let traded: HashSet<String> = operations
            .iter()
            .map(|operation| normalize_ticker(&operation.ticker))
            .collect();

        let mut current_prices = CurrentPrices::latest_by_ticker(price_records);
        current_prices.retain_tickers(|ticker| traded.contains(ticker));

        CalculationRequest {
            operations,
            current_prices,
            current_mep: latest_rate(rate_records, FxRateType::Mep),
            current_ccl: latest_rate(rate_records, FxRateType::Ccl),
            historical_mep: historical_rates_by_date(rate_records, FxRateType::Mep),
            historical_ccl: historical_rates_by_date(rate_records, FxRateType::Ccl),
        }
    }

    /// Structural checks the engine relies on its callers to perform.
    pub fn validate(&self) -> Result<()> {
        if self.operations.is_empty() {
            return Err(ValidationError::EmptyOperations.into());
        }
        for operation in &self.operations {
            if operation.ticker.trim().is_empty() {
                return Err(ValidationError::MissingField("ticker".to_string()).into());
            }
        }
        for price in self.current_prices.records() {
            price.validate()?;
        }
        for rate in self.current_mep.iter().chain(self.current_ccl.iter()) {
            rate.validate()?;
        }
        for rate in self.historical_mep.values().chain(self.historical_ccl.values()) {
            rate.validate()?;
        }
        Ok(())
    }
}

/// Money put into one ticker.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentTotals {
    pub total_invested_ars: Decimal,
    pub total_invested_usd_mep: Option<AggregateUsdValue>,
    pub total_invested_usd_ccl: Option<AggregateUsdValue>,
    pub avg_price_ars: Decimal,
    pub is_complete: bool,
}

/// Market value of one ticker at the current price.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentValuation {
    pub price: Option<CedearPriceRecord>,
    pub current_value_ars: Option<Decimal>,
    pub current_value_usd_mep: Option<UsdValueWithFx>,
    pub current_value_usd_ccl: Option<UsdValueWithFx>,
    pub is_complete: bool,
}

/// USD result of one methodology, with both sides it was derived from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsdPnl {
    pub value: Decimal,
    pub current_value: UsdValueWithFx,
    pub total_invested: AggregateUsdValue,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAndLoss {
    pub pnl_ars: Option<Decimal>,
    pub pnl_usd_mep: Option<UsdPnl>,
    pub pnl_usd_ccl: Option<UsdPnl>,
    pub is_complete: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TickerSummary {
    pub ticker: String,
    pub total_quantity: Decimal,
    pub totals: InvestmentTotals,
    pub current_valuation: CurrentValuation,
    pub profit_and_loss: ProfitAndLoss,
    pub operation_costs: Vec<OperationCost>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioInvestmentTotals {
    pub total_invested_ars: Decimal,
    pub total_invested_usd_mep: Option<AggregateUsdValue>,
    pub total_invested_usd_ccl: Option<AggregateUsdValue>,
    pub is_complete: bool,
}

/// Portfolio-wide market value. Unlike `CurrentValuation` it has no single price.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateValuation {
    pub current_value_ars: Option<Decimal>,
    pub current_value_usd_mep: Option<UsdValueWithFx>,
    pub current_value_usd_ccl: Option<UsdValueWithFx>,
    pub is_complete: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTotals {
    pub investment_totals: PortfolioInvestmentTotals,
    pub current_valuation: AggregateValuation,
    pub profit_and_loss: ProfitAndLoss,
    pub is_complete: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub tickers: Vec<TickerSummary>,
    pub totals: PortfolioTotals,
}
