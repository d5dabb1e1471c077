//! Cost aggregation and valuation for a whole portfolio.
//!
//! Every figure is computed independently for MEP and CCL. A missing input never turns
//! into a zero: it makes the dependent figure absent and clears the `is_complete` flag
//! of every aggregate above it.

use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::summary_model::{
    AggregateValuation, CalculationRequest, CurrentValuation, InvestmentTotals,
    PortfolioInvestmentTotals, PortfolioSummary, PortfolioTotals, ProfitAndLoss, TickerSummary,
    UsdPnl,
};
use crate::fx::{AggregateUsdValue, FxRateRecord, FxRateType, HistoricalRates, UsdValueWithFx};
use crate::operations::{build_operation_cost, Operation};
use crate::prices::{normalize_ticker, CurrentPrices};

/// Runs the full calculation: one summary per ticker plus portfolio totals.
///
/// Tickers are grouped case-insensitively, keep the spelling of their first operation,
/// and are returned sorted case-insensitively.
pub fn calculate_portfolio_summary(request: &CalculationRequest) -> PortfolioSummary {
    let mut tickers: Vec<TickerSummary> = group_by_ticker(&request.operations)
        .into_iter()
        .map(|(ticker, operations)| {
            build_ticker_summary(
                &ticker,
                &operations,
                &request.current_prices,
                request.current_mep.as_ref(),
                request.current_ccl.as_ref(),
                &request.historical_mep,
                &request.historical_ccl,
            )
        })
        .collect();
    tickers.sort_by_cached_key(|summary| normalize_ticker(&summary.ticker));

    let totals = build_portfolio_totals(
        &tickers,
        request.current_mep.as_ref(),
        request.current_ccl.as_ref(),
    );

    PortfolioSummary { tickers, totals }
}

fn group_by_ticker(operations: &[Operation]) -> Vec<(String, Vec<Operation>)> {
    let mut groups: Vec<(String, Vec<Operation>)> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for operation in operations {
        let key = normalize_ticker(&operation.ticker);
        let index = *index_by_key.entry(key).or_insert_with(|| {
            groups.push((operation.ticker.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[index].1.push(operation.clone());
    }
    groups
}

/// Summarizes the operations of a single ticker.
pub fn build_ticker_summary(
    ticker: &str,
    operations: &[Operation],
    current_prices: &CurrentPrices,
    current_mep: Option<&FxRateRecord>,
    current_ccl: Option<&FxRateRecord>,
    historical_mep: &HistoricalRates,
    historical_ccl: &HistoricalRates,
) -> TickerSummary {
    let operation_costs: Vec<_> = operations
        .iter()
        .map(|operation| build_operation_cost(operation, historical_mep, historical_ccl))
        .collect();

    let total_quantity: Decimal = operations.iter().map(|op| op.quantity).sum();
    let total_invested_ars: Decimal = operation_costs.iter().map(|cost| cost.ars_cost).sum();
    let avg_price_ars = if total_quantity.is_zero() {
        Decimal::ZERO
    } else {
        operations
            .iter()
            .map(|op| op.quantity * op.price_ars)
            .sum::<Decimal>()
            / total_quantity
    };

    let total_invested_usd_mep = aggregate_usd_values(
        FxRateType::Mep,
        total_invested_ars,
        operation_costs.iter().map(|cost| cost.usd_cost_mep.as_ref()),
    );
    let total_invested_usd_ccl = aggregate_usd_values(
        FxRateType::Ccl,
        total_invested_ars,
        operation_costs.iter().map(|cost| cost.usd_cost_ccl.as_ref()),
    );
    let totals_complete = operation_costs.is_empty()
        || (total_invested_usd_mep.is_some() && total_invested_usd_ccl.is_some());

    let price = current_prices.get(ticker).cloned();
    if price.is_none() {
        debug!("No current price for {}; valuation left empty.", ticker);
    }
    let current_value_ars = price.as_ref().map(|p| total_quantity * p.price_ars);
    let current_value_usd_mep = current_usd_value(current_value_ars, current_mep);
    let current_value_usd_ccl = current_usd_value(current_value_ars, current_ccl);
    let valuation_complete = current_value_ars.is_some()
        && current_value_usd_mep.is_some()
        && current_value_usd_ccl.is_some();

    let profit_and_loss = build_profit_and_loss(
        current_value_ars,
        total_invested_ars,
        (current_value_usd_mep.as_ref(), total_invested_usd_mep.as_ref()),
        (current_value_usd_ccl.as_ref(), total_invested_usd_ccl.as_ref()),
    );

    TickerSummary {
        ticker: ticker.to_string(),
        total_quantity,
        totals: InvestmentTotals {
            total_invested_ars,
            total_invested_usd_mep,
            total_invested_usd_ccl,
            avg_price_ars,
            is_complete: totals_complete,
        },
        current_valuation: CurrentValuation {
            price,
            current_value_ars,
            current_value_usd_mep,
            current_value_usd_ccl,
            is_complete: valuation_complete,
        },
        profit_and_loss,
        operation_costs,
    }
}

/// Rolls ticker summaries up into portfolio totals.
///
/// Current values are re-derived from the summed ARS value and the current quotes, not
/// summed from the ticker USD values.
pub fn build_portfolio_totals(
    tickers: &[TickerSummary],
    current_mep: Option<&FxRateRecord>,
    current_ccl: Option<&FxRateRecord>,
) -> PortfolioTotals {
    let total_invested_ars: Decimal = tickers.iter().map(|t| t.totals.total_invested_ars).sum();

    let total_invested_usd_mep = aggregate_usd_totals(
        FxRateType::Mep,
        total_invested_ars,
        tickers.iter().map(|t| t.totals.total_invested_usd_mep.as_ref()),
    );
    let total_invested_usd_ccl = aggregate_usd_totals(
        FxRateType::Ccl,
        total_invested_ars,
        tickers.iter().map(|t| t.totals.total_invested_usd_ccl.as_ref()),
    );
    let investment_complete = tickers.iter().all(|t| t.totals.is_complete);

    // All tickers or nothing.
    let current_value_ars: Option<Decimal> = tickers
        .iter()
        .map(|t| t.current_valuation.current_value_ars)
        .sum();
    let current_value_usd_mep = current_usd_value(current_value_ars, current_mep);
    let current_value_usd_ccl = current_usd_value(current_value_ars, current_ccl);
    let valuation_complete = current_value_ars.is_some()
        && current_value_usd_mep.is_some()
        && current_value_usd_ccl.is_some();

    let profit_and_loss = build_profit_and_loss(
        current_value_ars,
        total_invested_ars,
        (current_value_usd_mep.as_ref(), total_invested_usd_mep.as_ref()),
        (current_value_usd_ccl.as_ref(), total_invested_usd_ccl.as_ref()),
    );
    let is_complete = investment_complete && valuation_complete && profit_and_loss.is_complete;

    PortfolioTotals {
        investment_totals: PortfolioInvestmentTotals {
            total_invested_ars,
            total_invested_usd_mep,
            total_invested_usd_ccl,
            is_complete: investment_complete,
        },
        current_valuation: AggregateValuation {
            current_value_ars,
            current_value_usd_mep,
            current_value_usd_ccl,
            is_complete: valuation_complete,
        },
        profit_and_loss,
        is_complete,
    }
}

/// Sums per-operation USD costs. One missing cost makes the whole aggregate absent.
fn aggregate_usd_values<'a>(
    fx_type: FxRateType,
    total_invested_ars: Decimal,
    costs: impl ExactSizeIterator<Item = Option<&'a UsdValueWithFx>>,
) -> Option<AggregateUsdValue> {
    if costs.len() == 0 {
        return Some(AggregateUsdValue::empty(fx_type));
    }
    let costs: Vec<&UsdValueWithFx> = costs.collect::<Option<_>>()?;

    let value: Decimal = costs.iter().map(|cost| cost.value).sum();
    Some(AggregateUsdValue {
        fx_type,
        value,
        weighted_rate: weighted_rate(total_invested_ars, value),
        fx_rates_used: costs.into_iter().map(|cost| cost.fx_rate.clone()).collect(),
    })
}

/// Sums ticker aggregates. One missing aggregate makes the portfolio aggregate absent.
fn aggregate_usd_totals<'a>(
    fx_type: FxRateType,
    total_invested_ars: Decimal,
    totals: impl ExactSizeIterator<Item = Option<&'a AggregateUsdValue>>,
) -> Option<AggregateUsdValue> {
    if totals.len() == 0 {
        return Some(AggregateUsdValue::empty(fx_type));
    }
    let totals: Vec<&AggregateUsdValue> = totals.collect::<Option<_>>()?;

    let value: Decimal = totals.iter().map(|total| total.value).sum();
    Some(AggregateUsdValue {
        fx_type,
        value,
        weighted_rate: weighted_rate(total_invested_ars, value),
        fx_rates_used: totals
            .into_iter()
            .flat_map(|total| total.fx_rates_used.iter().cloned())
            .collect(),
    })
}

fn weighted_rate(total_ars: Decimal, total_usd: Decimal) -> Decimal {
    total_ars.checked_div(total_usd).unwrap_or(Decimal::ZERO)
}

/// Converts a current ARS value with a current quote. Buy-side quotes never convert.
fn current_usd_value(
    current_value_ars: Option<Decimal>,
    current_fx: Option<&FxRateRecord>,
) -> Option<UsdValueWithFx> {
    let (value, fx) = (current_value_ars?, current_fx?);
    if !fx.is_sell_rate {
        warn!(
            "Current {} quote of {} is a buy rate; current USD value not computed.",
            fx.rate_type, fx.rate_date
        );
        return None;
    }
    fx.convert(value)
}

fn build_profit_and_loss(
    current_value_ars: Option<Decimal>,
    total_invested_ars: Decimal,
    mep: (Option<&UsdValueWithFx>, Option<&AggregateUsdValue>),
    ccl: (Option<&UsdValueWithFx>, Option<&AggregateUsdValue>),
) -> ProfitAndLoss {
    let pnl_ars = current_value_ars.map(|value| value - total_invested_ars);
    let pnl_usd_mep = usd_pnl(mep.0, mep.1);
    let pnl_usd_ccl = usd_pnl(ccl.0, ccl.1);
    let is_complete = pnl_ars.is_some() && pnl_usd_mep.is_some() && pnl_usd_ccl.is_some();

    ProfitAndLoss {
        pnl_ars,
        pnl_usd_mep,
        pnl_usd_ccl,
        is_complete,
    }
}

fn usd_pnl(
    current_value: Option<&UsdValueWithFx>,
    total_invested: Option<&AggregateUsdValue>,
) -> Option<UsdPnl> {
    let (current_value, total_invested) = (current_value?, total_invested?);
    Some(UsdPnl {
        value: current_value.value - total_invested.value,
        current_value: current_value.clone(),
        total_invested: total_invested.clone(),
    })
}
