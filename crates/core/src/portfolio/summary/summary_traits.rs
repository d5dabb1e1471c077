//! Repository traits for the data a portfolio summary is computed from.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;
use crate::fx::FxRateRecord;
use crate::operations::Operation;
use crate::prices::CedearPriceRecord;

/// Read access to stored operations, prices, and dollar quotes.
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    async fn portfolio_exists(&self, portfolio_id: Uuid) -> Result<bool>;

    async fn get_operations(&self, portfolio_id: Uuid) -> Result<Vec<Operation>>;

    /// Every stored price for the given tickers; the caller picks the latest.
    async fn get_cedear_prices(&self, tickers: &[String]) -> Result<Vec<CedearPriceRecord>>;

    /// The full dated history of MEP and CCL quotes.
    async fn get_dollar_rates(&self) -> Result<Vec<FxRateRecord>>;
}
