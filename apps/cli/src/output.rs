use cedear_ledger_core::constants::{DISPLAY_DECIMAL_PRECISION, RATE_DECIMAL_PRECISION};
use cedear_ledger_core::fx::{AggregateUsdValue, UsdValueWithFx};
use cedear_ledger_core::operations::OperationCost;
use cedear_ledger_core::summary::{PortfolioSummary, UsdPnl};
use cedear_ledger_core::valuation::PortfolioValuation;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

const MISSING: &str = "-";

#[derive(Tabled)]
struct TickerRow {
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Invested ARS")]
    invested_ars: String,
    #[tabled(rename = "Invested MEP")]
    invested_mep: String,
    #[tabled(rename = "Invested CCL")]
    invested_ccl: String,
    #[tabled(rename = "Current ARS")]
    current_ars: String,
    #[tabled(rename = "Current MEP")]
    current_mep: String,
    #[tabled(rename = "Current CCL")]
    current_ccl: String,
    #[tabled(rename = "P&L ARS")]
    pnl_ars: String,
    #[tabled(rename = "P&L MEP")]
    pnl_mep: String,
    #[tabled(rename = "P&L CCL")]
    pnl_ccl: String,
    #[tabled(rename = "Complete")]
    complete: String,
}

#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Cost ARS")]
    cost_ars: String,
    #[tabled(rename = "MEP rate")]
    mep_rate: String,
    #[tabled(rename = "Cost MEP")]
    cost_mep: String,
    #[tabled(rename = "CCL rate")]
    ccl_rate: String,
    #[tabled(rename = "Cost CCL")]
    cost_ccl: String,
}

#[derive(Tabled)]
struct PositionRow {
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Avg Cost")]
    avg_cost: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Market Value")]
    market_value: String,
    #[tabled(rename = "Unrealized")]
    unrealized: String,
    #[tabled(rename = "%")]
    percent: String,
    #[tabled(rename = "Price Date")]
    price_date: String,
}

fn amount(value: Decimal) -> String {
    value.round_dp(DISPLAY_DECIMAL_PRECISION).to_string()
}

fn optional_amount(value: Option<Decimal>) -> String {
    value.map(amount).unwrap_or_else(|| MISSING.to_string())
}

fn usd(value: Option<&UsdValueWithFx>) -> String {
    optional_amount(value.map(|usd| usd.value))
}

fn rate(value: Option<&UsdValueWithFx>) -> String {
    value
        .map(|usd| usd.fx_rate.rate_value.round_dp(RATE_DECIMAL_PRECISION).to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

fn aggregate(value: Option<&AggregateUsdValue>) -> String {
    optional_amount(value.map(|usd| usd.value))
}

fn pnl(value: Option<&UsdPnl>) -> String {
    optional_amount(value.map(|pnl| pnl.value))
}

/// Valuation ratios are fractions; tables show them as percentages.
fn percent(ratio: Decimal) -> String {
    amount(ratio * Decimal::ONE_HUNDRED)
}

fn yes_no(value: bool) -> String {
    let label = if value { "yes" } else { "no" };
    label.to_string()
}

fn build_ticker_rows(summary: &PortfolioSummary) -> Vec<TickerRow> {
    let mut rows: Vec<TickerRow> = summary
        .tickers
        .iter()
        .map(|t| TickerRow {
            ticker: t.ticker.clone(),
            quantity: t.total_quantity.normalize().to_string(),
            invested_ars: amount(t.totals.total_invested_ars),
            invested_mep: aggregate(t.totals.total_invested_usd_mep.as_ref()),
            invested_ccl: aggregate(t.totals.total_invested_usd_ccl.as_ref()),
            current_ars: optional_amount(t.current_valuation.current_value_ars),
            current_mep: usd(t.current_valuation.current_value_usd_mep.as_ref()),
            current_ccl: usd(t.current_valuation.current_value_usd_ccl.as_ref()),
            pnl_ars: optional_amount(t.profit_and_loss.pnl_ars),
            pnl_mep: pnl(t.profit_and_loss.pnl_usd_mep.as_ref()),
            pnl_ccl: pnl(t.profit_and_loss.pnl_usd_ccl.as_ref()),
            complete: yes_no(t.totals.is_complete && t.current_valuation.is_complete),
        })
        .collect();

    let totals = &summary.totals;
    rows.push(TickerRow {
        ticker: "TOTAL".to_string(),
        quantity: String::new(),
        invested_ars: amount(totals.investment_totals.total_invested_ars),
        invested_mep: aggregate(totals.investment_totals.total_invested_usd_mep.as_ref()),
        invested_ccl: aggregate(totals.investment_totals.total_invested_usd_ccl.as_ref()),
        current_ars: optional_amount(totals.current_valuation.current_value_ars),
        current_mep: usd(totals.current_valuation.current_value_usd_mep.as_ref()),
        current_ccl: usd(totals.current_valuation.current_value_usd_ccl.as_ref()),
        pnl_ars: optional_amount(totals.profit_and_loss.pnl_ars),
        pnl_mep: pnl(totals.profit_and_loss.pnl_usd_mep.as_ref()),
        pnl_ccl: pnl(totals.profit_and_loss.pnl_usd_ccl.as_ref()),
        complete: yes_no(totals.is_complete),
    });
    rows
}

fn build_operation_rows(summary: &PortfolioSummary) -> Vec<OperationRow> {
    summary
        .tickers
        .iter()
        .flat_map(|t| t.operation_costs.iter())
        .map(|cost: &OperationCost| OperationRow {
            date: cost.operation.trade_date.to_string(),
            ticker: cost.operation.ticker.clone(),
            quantity: cost.operation.quantity.normalize().to_string(),
            cost_ars: amount(cost.ars_cost),
            mep_rate: rate(cost.usd_cost_mep.as_ref()),
            cost_mep: usd(cost.usd_cost_mep.as_ref()),
            ccl_rate: rate(cost.usd_cost_ccl.as_ref()),
            cost_ccl: usd(cost.usd_cost_ccl.as_ref()),
        })
        .collect()
}

fn build_position_rows(valuation: &PortfolioValuation) -> Vec<PositionRow> {
    let mut rows: Vec<PositionRow> = valuation
        .positions
        .iter()
        .map(|p| PositionRow {
            ticker: p.ticker.clone(),
            quantity: p.quantity.normalize().to_string(),
            avg_cost: amount(p.avg_cost_ars),
            cost: amount(p.cost_ars),
            price: amount(p.market_price_ars),
            market_value: amount(p.market_value_ars),
            unrealized: amount(p.unrealized_pnl_ars),
            percent: percent(p.unrealized_pnl_percent),
            price_date: p
                .price_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
        })
        .collect();

    rows.push(PositionRow {
        ticker: "TOTAL".to_string(),
        quantity: String::new(),
        avg_cost: String::new(),
        cost: amount(valuation.total_cost_ars),
        price: String::new(),
        market_value: amount(valuation.total_market_value_ars),
        unrealized: amount(valuation.total_unrealized_pnl_ars),
        percent: percent(valuation.total_unrealized_pnl_percent),
        price_date: String::new(),
    });
    rows
}

pub fn render_summary_table(summary: &PortfolioSummary, with_operations: bool) -> String {
    let mut table = Table::new(build_ticker_rows(summary));
    table.with(Style::rounded());
    if !with_operations {
        return table.to_string();
    }
    let mut operations = Table::new(build_operation_rows(summary));
    operations.with(Style::rounded());
    format!("{}\n\n{}", table, operations)
}

pub fn render_valuation_table(valuation: &PortfolioValuation) -> String {
    let mut table = Table::new(build_position_rows(valuation));
    table.with(Style::rounded());
    table.to_string()
}

pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cedear_ledger_core::fx::{FxRateRecord, FxRateType};
    use cedear_ledger_core::summary::{
        AggregateValuation, PortfolioInvestmentTotals, PortfolioTotals, ProfitAndLoss,
    };
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn empty_summary() -> PortfolioSummary {
        PortfolioSummary {
            tickers: Vec::new(),
            totals: PortfolioTotals {
                investment_totals: PortfolioInvestmentTotals {
                    total_invested_ars: Decimal::ZERO,
                    total_invested_usd_mep: Some(AggregateUsdValue::empty(FxRateType::Mep)),
                    total_invested_usd_ccl: Some(AggregateUsdValue::empty(FxRateType::Ccl)),
                    is_complete: true,
                },
                current_valuation: AggregateValuation {
                    current_value_ars: None,
                    current_value_usd_mep: None,
                    current_value_usd_ccl: None,
                    is_complete: false,
                },
                profit_and_loss: ProfitAndLoss {
                    pnl_ars: None,
                    pnl_usd_mep: None,
                    pnl_usd_ccl: None,
                    is_complete: false,
                },
                is_complete: false,
            },
        }
    }

    #[test]
    fn amounts_round_to_display_precision() {
        assert_eq!(amount(dec!(10.126)), "10.13");
        assert_eq!(optional_amount(None), MISSING);
    }

    #[test]
    fn rates_keep_rate_precision() {
        let usd = UsdValueWithFx {
            value: dec!(1),
            fx_rate: FxRateRecord {
                rate_type: FxRateType::Mep,
                rate_value: dec!(1012.1234567),
                rate_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                retrieved_at: Utc.with_ymd_and_hms(2024, 1, 10, 18, 0, 0).unwrap(),
                source: "manual".to_string(),
                is_manual: true,
                is_sell_rate: true,
            },
        };
        assert_eq!(rate(Some(&usd)), "1012.123457");
    }

    #[test]
    fn summary_table_always_has_a_total_row() {
        let rendered = render_summary_table(&empty_summary(), false);
        assert!(rendered.contains("Ticker"));
        assert!(rendered.contains("TOTAL"));
        assert!(rendered.contains("Invested MEP"));
    }

    #[test]
    fn valuation_table_lists_positions() {
        let valuation = PortfolioValuation {
            portfolio_id: Uuid::nil(),
            calculated_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            total_cost_ars: dec!(1000),
            total_market_value_ars: dec!(1200),
            total_unrealized_pnl_ars: dec!(200),
            total_unrealized_pnl_percent: dec!(0.2),
            positions: Vec::new(),
        };
        let rendered = render_valuation_table(&valuation);
        assert!(rendered.contains("TOTAL"));
        assert!(rendered.contains("1200"));
        assert_eq!(percent(dec!(0.2)), "20.0");
    }
}
