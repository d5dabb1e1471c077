//! Average-cost valuation domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Buy and sell volume of one ticker, sells as positive magnitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationAggregate {
    pub ticker: String,
    pub buy_quantity: Decimal,
    pub sell_quantity: Decimal,
    pub buy_cost: Decimal,
    pub sell_cost: Decimal,
}

/// Price used to mark a position, with the date it was quoted.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    pub price_ars: Decimal,
    pub price_date: NaiveDate,
}

/// Open position of one ticker marked at its latest price.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TickerValuation {
    pub ticker: String,
    pub quantity: Decimal,
    pub avg_cost_ars: Decimal,
    pub cost_ars: Decimal,
    pub market_price_ars: Decimal,
    pub market_value_ars: Decimal,
    pub unrealized_pnl_ars: Decimal,
    pub unrealized_pnl_percent: Decimal,
    pub price_date: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub portfolio_id: Uuid,
    pub calculated_at: DateTime<Utc>,
    pub total_cost_ars: Decimal,
    pub total_market_value_ars: Decimal,
    pub total_unrealized_pnl_ars: Decimal,
    pub total_unrealized_pnl_percent: Decimal,
    pub positions: Vec<TickerValuation>,
}
