use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use super::valuation_model::{
    OperationAggregate, PortfolioValuation, PriceSnapshot, TickerValuation,
};
use crate::operations::Operation;
use crate::prices::{normalize_ticker, CurrentPrices};

/// Splits operations into buy and sell volume per ticker (case-insensitive), in order
/// of first appearance.
pub fn aggregate_operations(operations: &[Operation]) -> Vec<OperationAggregate> {
    let mut aggregates: Vec<OperationAggregate> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for operation in operations {
        let index = *index_by_key
            .entry(normalize_ticker(&operation.ticker))
            .or_insert_with(|| {
                aggregates.push(OperationAggregate {
                    ticker: operation.ticker.clone(),
                    buy_quantity: Decimal::ZERO,
                    sell_quantity: Decimal::ZERO,
                    buy_cost: Decimal::ZERO,
                    sell_cost: Decimal::ZERO,
                });
                aggregates.len() - 1
            });

        let aggregate = &mut aggregates[index];
        if operation.quantity > Decimal::ZERO {
            aggregate.buy_quantity += operation.quantity;
            aggregate.buy_cost += operation.quantity * operation.price_ars;
        } else if operation.quantity < Decimal::ZERO {
            aggregate.sell_quantity -= operation.quantity;
            aggregate.sell_cost -= operation.quantity * operation.price_ars;
        }
    }
    aggregates
}

/// Latest price of each ticker as a dated snapshot, keyed by normalized ticker.
pub fn price_snapshots(prices: &CurrentPrices) -> HashMap<String, PriceSnapshot> {
    prices
        .records()
        .map(|record| {
            (
                normalize_ticker(&record.ticker),
                PriceSnapshot {
                    price_ars: record.price_ars,
                    price_date: record.as_of.date_naive(),
                },
            )
        })
        .collect()
}

/// Values open positions at average cost.
///
/// Positions whose net quantity is not positive are left out. A position without a price
/// still counts toward total cost, but its market figures are zero.
pub fn calculate_portfolio_valuation(
    portfolio_id: Uuid,
    aggregates: &[OperationAggregate],
    price_lookup: &HashMap<String, PriceSnapshot>,
    calculated_at: DateTime<Utc>,
) -> PortfolioValuation {
    let mut positions = Vec::with_capacity(aggregates.len());
    let mut total_cost = Decimal::ZERO;
    let mut total_market_value = Decimal::ZERO;
    let mut total_unrealized = Decimal::ZERO;

    for aggregate in aggregates {
        let quantity = aggregate.buy_quantity - aggregate.sell_quantity;
        if quantity <= Decimal::ZERO {
            debug!("Skipping closed position {} (net quantity {}).", aggregate.ticker, quantity);
            continue;
        }

        let cost_ars = aggregate.buy_cost - aggregate.sell_cost;
        let avg_cost_ars = if cost_ars > Decimal::ZERO {
            cost_ars / quantity
        } else {
            Decimal::ZERO
        };
        total_cost += cost_ars;

        let position = match price_lookup.get(&normalize_ticker(&aggregate.ticker)) {
            Some(snapshot) => {
                let market_value_ars = quantity * snapshot.price_ars;
                let unrealized_pnl_ars = (snapshot.price_ars - avg_cost_ars) * quantity;
                let unrealized_pnl_percent = if avg_cost_ars > Decimal::ZERO {
                    snapshot.price_ars / avg_cost_ars - Decimal::ONE
                } else {
                    Decimal::ZERO
                };
                total_market_value += market_value_ars;
                total_unrealized += unrealized_pnl_ars;

                TickerValuation {
                    ticker: aggregate.ticker.clone(),
                    quantity,
                    avg_cost_ars,
                    cost_ars,
                    market_price_ars: snapshot.price_ars,
                    market_value_ars,
                    unrealized_pnl_ars,
                    unrealized_pnl_percent,
                    price_date: Some(snapshot.price_date),
                }
            }
            None => {
                debug!("No price for {}; market value reported as zero.", aggregate.ticker);
                TickerValuation {
                    ticker: aggregate.ticker.clone(),
                    quantity,
                    avg_cost_ars,
                    cost_ars,
                    market_price_ars: Decimal::ZERO,
                    market_value_ars: Decimal::ZERO,
                    unrealized_pnl_ars: Decimal::ZERO,
                    unrealized_pnl_percent: Decimal::ZERO,
                    price_date: None,
                }
            }
        };
        positions.push(position);
    }

    let total_unrealized_pnl_percent = if total_cost > Decimal::ZERO {
        total_market_value / total_cost - Decimal::ONE
    } else {
        Decimal::ZERO
    };

    PortfolioValuation {
        portfolio_id,
        calculated_at,
        total_cost_ars: total_cost,
        total_market_value_ars: total_market_value,
        total_unrealized_pnl_ars: total_unrealized,
        total_unrealized_pnl_percent,
        positions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    fn calculated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 28, 0, 0, 0).unwrap()
    }

    fn snapshot(price: Decimal) -> PriceSnapshot {
        PriceSnapshot {
            price_ars: price,
            price_date: NaiveDate::from_ymd_opt(2026, 1, 28).unwrap(),
        }
    }

    fn aggregate(
        ticker: &str,
        buy_quantity: Decimal,
        sell_quantity: Decimal,
        buy_cost: Decimal,
        sell_cost: Decimal,
    ) -> OperationAggregate {
        OperationAggregate {
            ticker: ticker.to_string(),
            buy_quantity,
            sell_quantity,
            buy_cost,
            sell_cost,
        }
    }

    fn operation(ticker: &str, quantity: Decimal, price: Decimal) -> Operation {
        Operation {
            trade_date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            ticker: ticker.to_string(),
            quantity,
            price_ars: price,
            fees_ars: None,
        }
    }

    fn assert_close(actual: Decimal, expected: Decimal) {
        assert_eq!(actual.round_dp(6), expected.round_dp(6));
    }

    #[test]
    fn test_avg_cost_and_pnl_for_multiple_buys() {
        let prices = HashMap::from([("AAPL".to_string(), snapshot(dec!(150)))]);
        let aggregates = vec![aggregate("AAPL", dec!(15), dec!(0), dec!(1600), dec!(0))];

        let result =
            calculate_portfolio_valuation(Uuid::new_v4(), &aggregates, &prices, calculated_at());

        assert_eq!(result.positions.len(), 1);
        let position = &result.positions[0];
        assert_eq!(position.quantity, dec!(15));
        assert_eq!(position.cost_ars, dec!(1600));
        assert_eq!(position.market_price_ars, dec!(150));
        assert_eq!(position.market_value_ars, dec!(2250));
        assert_close(position.avg_cost_ars, dec!(1600) / dec!(15));
        assert_close(
            position.unrealized_pnl_ars,
            (dec!(150) - dec!(1600) / dec!(15)) * dec!(15),
        );
        assert_close(
            position.unrealized_pnl_percent,
            dec!(150) / (dec!(1600) / dec!(15)) - dec!(1),
        );
    }

    #[test]
    fn test_avg_cost_with_sells() {
        let prices = HashMap::from([("MSFT".to_string(), snapshot(dec!(110)))]);
        let aggregates = vec![aggregate("MSFT", dec!(15), dec!(4), dec!(1600), dec!(520))];

        let result =
            calculate_portfolio_valuation(Uuid::new_v4(), &aggregates, &prices, calculated_at());

        let position = &result.positions[0];
        assert_eq!(position.quantity, dec!(11));
        assert_eq!(position.cost_ars, dec!(1080));
        assert_eq!(position.market_value_ars, dec!(1210));
        assert_close(position.avg_cost_ars, dec!(1080) / dec!(11));
        assert_close(
            position.unrealized_pnl_ars,
            (dec!(110) - dec!(1080) / dec!(11)) * dec!(11),
        );
    }

    #[test]
    fn test_closed_positions_are_excluded() {
        let aggregates = vec![aggregate("KO", dec!(5), dec!(5), dec!(500), dec!(600))];
        let result = calculate_portfolio_valuation(
            Uuid::new_v4(),
            &aggregates,
            &HashMap::new(),
            calculated_at(),
        );

        assert!(result.positions.is_empty());
        assert_eq!(result.total_cost_ars, Decimal::ZERO);
        assert_eq!(result.total_unrealized_pnl_percent, Decimal::ZERO);
    }

    #[test]
    fn test_unpriced_position_counts_cost_only() {
        let prices = HashMap::from([("AAPL".to_string(), snapshot(dec!(200)))]);
        let aggregates = vec![
            aggregate("AAPL", dec!(10), dec!(0), dec!(1000), dec!(0)),
            aggregate("GGAL", dec!(4), dec!(0), dec!(1000), dec!(0)),
        ];

        let result =
            calculate_portfolio_valuation(Uuid::new_v4(), &aggregates, &prices, calculated_at());

        assert_eq!(result.total_cost_ars, dec!(2000));
        assert_eq!(result.total_market_value_ars, dec!(2000));
        assert_eq!(result.total_unrealized_pnl_ars, dec!(1000));
        assert_eq!(result.total_unrealized_pnl_percent, Decimal::ZERO);
        let unpriced = &result.positions[1];
        assert_eq!(unpriced.market_value_ars, Decimal::ZERO);
        assert!(unpriced.price_date.is_none());
    }

    #[test]
    fn test_aggregate_operations_splits_buys_and_sells() {
        let aggregates = aggregate_operations(&[
            operation("msft", dec!(10), dec!(100)),
            operation("MSFT", dec!(5), dec!(120)),
            operation("Msft", dec!(-4), dec!(130)),
            operation("KO", dec!(2), dec!(50)),
        ]);

        assert_eq!(aggregates.len(), 2);
        assert_eq!(
            aggregates[0],
            aggregate("msft", dec!(15), dec!(4), dec!(1600), dec!(520))
        );
        assert_eq!(aggregates[1].ticker, "KO");
    }
}
