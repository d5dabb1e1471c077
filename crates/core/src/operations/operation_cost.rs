use log::debug;
use rust_decimal::Decimal;

use super::operations_model::{Operation, OperationCost};
use crate::fx::{find_historical_rate, HistoricalRates, UsdValueWithFx};

/// Prices one operation in ARS and in both dollar methodologies.
///
/// Each methodology resolves its own historical quote; a missing quote leaves that
/// side absent and marks the cost incomplete without affecting the other side.
pub fn build_operation_cost(
    operation: &Operation,
    historical_mep: &HistoricalRates,
    historical_ccl: &HistoricalRates,
) -> OperationCost {
    let ars_cost = operation.ars_cost();

    let usd_cost_mep = convert_at_trade_date(operation, ars_cost, historical_mep);
    let usd_cost_ccl = convert_at_trade_date(operation, ars_cost, historical_ccl);
    let is_complete = usd_cost_mep.is_some() && usd_cost_ccl.is_some();

    OperationCost {
        operation: operation.clone(),
        ars_cost,
        usd_cost_mep,
        usd_cost_ccl,
        is_complete,
    }
}

fn convert_at_trade_date(
    operation: &Operation,
    ars_cost: Decimal,
    history: &HistoricalRates,
) -> Option<UsdValueWithFx> {
    let Some(rate) = find_historical_rate(operation.trade_date, history) else {
        debug!(
            "No historical rate for {} operation on {}; USD cost left empty.",
            operation.ticker, operation.trade_date
        );
        return None;
    };
    rate.convert(ars_cost)
}
