use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use super::calculation_engine::calculate_portfolio_summary;
use super::summary_model::{CalculationRequest, PortfolioSummary};
use super::summary_traits::LedgerRepositoryTrait;
use crate::errors::{Error, Result};
use crate::operations::Operation;
use crate::portfolio::valuation::{
    aggregate_operations, calculate_portfolio_valuation, price_snapshots, PortfolioValuation,
};
use crate::prices::{normalize_ticker, CurrentPrices};

#[async_trait]
pub trait PortfolioSummaryServiceTrait: Send + Sync {
    /// Computes the MEP/CCL summary of a portfolio.
    ///
    /// Returns `Ok(None)` when the portfolio does not exist.
    async fn get_summary(&self, portfolio_id: Uuid) -> Result<Option<PortfolioSummary>>;

    /// Values the open positions of a portfolio at average cost, in ARS.
    async fn get_valuation(
        &self,
        portfolio_id: Uuid,
        calculated_at: DateTime<Utc>,
    ) -> Result<PortfolioValuation>;
}

#[derive(Clone)]
pub struct PortfolioSummaryService {
    repository: Arc<dyn LedgerRepositoryTrait>,
}

impl PortfolioSummaryService {
    pub fn new(repository: Arc<dyn LedgerRepositoryTrait>) -> Self {
        Self { repository }
    }
}

fn traded_tickers(operations: &[Operation]) -> Vec<String> {
    operations
        .iter()
        .map(|operation| normalize_ticker(&operation.ticker))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[async_trait]
impl PortfolioSummaryServiceTrait for PortfolioSummaryService {
    async fn get_summary(&self, portfolio_id: Uuid) -> Result<Option<PortfolioSummary>> {
        if !self.repository.portfolio_exists(portfolio_id).await? {
            debug!("Portfolio {} not found; no summary.", portfolio_id);
            return Ok(None);
        }

        let operations = self.repository.get_operations(portfolio_id).await?;
        let tickers = traded_tickers(&operations);
        let prices = if tickers.is_empty() {
            Vec::new()
        } else {
            self.repository.get_cedear_prices(&tickers).await?
        };
        let rates = self.repository.get_dollar_rates().await?;

        let request = CalculationRequest::assemble(operations, prices, &rates);
        if !request.operations.is_empty() {
            request.validate()?;
        }
        let summary = calculate_portfolio_summary(&request);
        info!(
            "Summary for portfolio {}: {} tickers, complete: {}",
            portfolio_id,
            summary.tickers.len(),
            summary.totals.is_complete
        );
        Ok(Some(summary))
    }

    async fn get_valuation(
        &self,
        portfolio_id: Uuid,
        calculated_at: DateTime<Utc>,
    ) -> Result<PortfolioValuation> {
        if !self.repository.portfolio_exists(portfolio_id).await? {
            return Err(Error::PortfolioNotFound(portfolio_id));
        }

        let operations = self.repository.get_operations(portfolio_id).await?;
        let aggregates = aggregate_operations(&operations);
        let tickers = traded_tickers(&operations);
        let prices = if tickers.is_empty() {
            CurrentPrices::new()
        } else {
            CurrentPrices::latest_by_ticker(self.repository.get_cedear_prices(&tickers).await?)
        };

        Ok(calculate_portfolio_valuation(
            portfolio_id,
            &aggregates,
            &price_snapshots(&prices),
            calculated_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::{FxRateRecord, FxRateType};
    use crate::prices::CedearPriceRecord;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockLedgerRepository {
        portfolio_id: Option<Uuid>,
        operations: Vec<Operation>,
        prices: Vec<CedearPriceRecord>,
        rates: Vec<FxRateRecord>,
        requested_tickers: Mutex<Vec<Vec<String>>>,
        rates_unavailable: bool,
    }

    #[async_trait]
    impl LedgerRepositoryTrait for MockLedgerRepository {
        async fn portfolio_exists(&self, portfolio_id: Uuid) -> Result<bool> {
            Ok(self.portfolio_id == Some(portfolio_id))
        }

        async fn get_operations(&self, _portfolio_id: Uuid) -> Result<Vec<Operation>> {
            Ok(self.operations.clone())
        }

        async fn get_cedear_prices(&self, tickers: &[String]) -> Result<Vec<CedearPriceRecord>> {
            self.requested_tickers.lock().unwrap().push(tickers.to_vec());
            Ok(self.prices.clone())
        }

        async fn get_dollar_rates(&self) -> Result<Vec<FxRateRecord>> {
            if self.rates_unavailable {
                return Err(Error::Repository("dollar rates table unavailable".to_string()));
            }
            Ok(self.rates.clone())
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn operation(ticker: &str, quantity: Decimal, price: Decimal, d: u32) -> Operation {
        Operation {
            trade_date: day(d),
            ticker: ticker.to_string(),
            quantity,
            price_ars: price,
            fees_ars: None,
        }
    }

    fn rate(fx_type: FxRateType, d: u32, value: Decimal) -> FxRateRecord {
        FxRateRecord {
            rate_type: fx_type,
            rate_value: value,
            rate_date: day(d),
            retrieved_at: Utc.with_ymd_and_hms(2024, 1, d, 18, 0, 0).unwrap(),
            source: "iol".to_string(),
            is_manual: false,
            is_sell_rate: true,
        }
    }

    fn price(ticker: &str, value: Decimal, hour: u32) -> CedearPriceRecord {
        CedearPriceRecord {
            ticker: ticker.to_string(),
            price_ars: value,
            as_of: Utc.with_ymd_and_hms(2024, 1, 20, hour, 0, 0).unwrap(),
            source: "iol".to_string(),
            is_manual: false,
        }
    }

    fn repository(portfolio_id: Uuid) -> MockLedgerRepository {
        MockLedgerRepository {
            portfolio_id: Some(portfolio_id),
            operations: vec![
                operation("AAPL", dec!(10), dec!(100), 10),
                operation("aapl", dec!(5), dec!(120), 15),
            ],
            prices: vec![
                price("AAPL", dec!(130), 10),
                price("AAPL", dec!(150), 16),
                price("KO", dec!(90), 16),
            ],
            rates: vec![
                rate(FxRateType::Mep, 10, dec!(100)),
                rate(FxRateType::Mep, 20, dec!(125)),
                rate(FxRateType::Ccl, 10, dec!(200)),
                rate(FxRateType::Ccl, 14, dec!(240)),
                rate(FxRateType::Ccl, 20, dec!(250)),
            ],
            requested_tickers: Mutex::new(Vec::new()),
            rates_unavailable: false,
        }
    }

    #[tokio::test]
    async fn test_summary_for_unknown_portfolio_is_none() {
        let service = PortfolioSummaryService::new(Arc::new(repository(Uuid::new_v4())));
        let result = service.get_summary(Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_summary_assembles_latest_inputs() {
        let portfolio_id = Uuid::new_v4();
        let repo = Arc::new(repository(portfolio_id));
        let service = PortfolioSummaryService::new(repo.clone());

        let summary = service.get_summary(portfolio_id).await.unwrap().unwrap();

        assert_eq!(
            *repo.requested_tickers.lock().unwrap(),
            vec![vec!["AAPL".to_string()]]
        );
        assert_eq!(summary.tickers.len(), 1);
        let aapl = &summary.tickers[0];
        assert_eq!(aapl.total_quantity, dec!(15));
        assert_eq!(aapl.totals.total_invested_ars, dec!(1600));

        // 1000 / 100 + 600 / 100 on the MEP side; 1000 / 200 + 600 / 240 on the CCL side.
        let mep = aapl.totals.total_invested_usd_mep.as_ref().unwrap();
        assert_eq!(mep.value, dec!(16));
        assert_eq!(mep.weighted_rate, dec!(100));
        let ccl = aapl.totals.total_invested_usd_ccl.as_ref().unwrap();
        assert_eq!(ccl.value, dec!(7.5));

        assert_eq!(aapl.current_valuation.price.as_ref().unwrap().price_ars, dec!(150));
        assert_eq!(aapl.current_valuation.current_value_ars, Some(dec!(2250)));
        assert_eq!(
            aapl.current_valuation.current_value_usd_mep.as_ref().unwrap().value,
            dec!(18)
        );
        assert_eq!(
            aapl.current_valuation.current_value_usd_ccl.as_ref().unwrap().value,
            dec!(9)
        );
        assert!(summary.totals.is_complete);
        assert_eq!(summary.totals.profit_and_loss.pnl_ars, Some(dec!(650)));
        assert_eq!(
            summary.totals.profit_and_loss.pnl_usd_mep.as_ref().unwrap().value,
            dec!(2)
        );
    }

    #[tokio::test]
    async fn test_empty_portfolio_skips_price_lookup() {
        let portfolio_id = Uuid::new_v4();
        let mut repo = repository(portfolio_id);
        repo.operations.clear();
        let repo = Arc::new(repo);
        let service = PortfolioSummaryService::new(repo.clone());

        let summary = service.get_summary(portfolio_id).await.unwrap().unwrap();

        assert!(summary.tickers.is_empty());
        assert!(repo.requested_tickers.lock().unwrap().is_empty());
        assert_eq!(summary.totals.current_valuation.current_value_ars, Some(Decimal::ZERO));
        assert!(summary.totals.investment_totals.is_complete);
    }

    #[tokio::test]
    async fn test_summary_propagates_repository_errors() {
        let portfolio_id = Uuid::new_v4();
        let mut repo = repository(portfolio_id);
        repo.rates_unavailable = true;
        let service = PortfolioSummaryService::new(Arc::new(repo));

        let result = service.get_summary(portfolio_id).await;
        assert!(matches!(result, Err(Error::Repository(_))));
    }

    #[tokio::test]
    async fn test_summary_rejects_invalid_stored_rates() {
        let portfolio_id = Uuid::new_v4();
        let mut repo = repository(portfolio_id);
        repo.rates.push(rate(FxRateType::Mep, 12, Decimal::ZERO));
        let service = PortfolioSummaryService::new(Arc::new(repo));

        let result = service.get_summary(portfolio_id).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_valuation_for_unknown_portfolio_errors() {
        let service = PortfolioSummaryService::new(Arc::new(repository(Uuid::new_v4())));
        let result = service.get_valuation(Uuid::new_v4(), Utc::now()).await;
        assert!(matches!(result, Err(Error::PortfolioNotFound(_))));
    }

    #[tokio::test]
    async fn test_valuation_uses_latest_price() {
        let portfolio_id = Uuid::new_v4();
        let service = PortfolioSummaryService::new(Arc::new(repository(portfolio_id)));
        let calculated_at = Utc.with_ymd_and_hms(2024, 1, 21, 0, 0, 0).unwrap();

        let valuation = service.get_valuation(portfolio_id, calculated_at).await.unwrap();

        assert_eq!(valuation.portfolio_id, portfolio_id);
        assert_eq!(valuation.calculated_at, calculated_at);
        assert_eq!(valuation.positions.len(), 1);
        assert_eq!(valuation.positions[0].market_price_ars, dec!(150));
        assert_eq!(valuation.total_market_value_ars, dec!(2250));
        assert_eq!(valuation.total_unrealized_pnl_ars.round_dp(6), dec!(650));
    }
}
