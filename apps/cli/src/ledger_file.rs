//! JSON ledger snapshot: the CLI's stand-in for the storage layer.

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use cedear_ledger_core::constants::SOURCE_MANUAL;
use cedear_ledger_core::fx::{FxRateRecord, FxRateType};
use cedear_ledger_core::operations::{NewOperation, Operation};
use cedear_ledger_core::prices::{normalize_ticker, CedearPriceRecord};
use cedear_ledger_core::summary::LedgerRepositoryTrait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioEntry {
    pub id: Uuid,
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OperationEntry {
    pub portfolio_id: Uuid,
    pub ticker: String,
    pub quantity: Decimal,
    pub price_ars: Decimal,
    #[serde(default)]
    pub fees_ars: Option<Decimal>,
    pub operation_date: NaiveDate,
}

/// Stored dollar quote. Stored quotes are sell rates unless marked otherwise.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DollarRateEntry {
    pub dollar_type: FxRateType,
    pub rate: Decimal,
    pub rate_date: NaiveDate,
    #[serde(default)]
    pub retrieved_at: Option<DateTime<Utc>>,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub is_manual: bool,
    #[serde(default = "default_true")]
    pub is_sell_rate: bool,
}

fn default_source() -> String {
    SOURCE_MANUAL.to_string()
}

fn default_true() -> bool {
    true
}

impl DollarRateEntry {
    fn into_record(self) -> FxRateRecord {
        let retrieved_at = self
            .retrieved_at
            .unwrap_or_else(|| self.rate_date.and_time(chrono::NaiveTime::MIN).and_utc());
        FxRateRecord {
            rate_type: self.dollar_type,
            rate_value: self.rate,
            rate_date: self.rate_date,
            retrieved_at,
            source: self.source,
            is_manual: self.is_manual,
            is_sell_rate: self.is_sell_rate,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct LedgerFile {
    #[serde(default)]
    pub portfolios: Vec<PortfolioEntry>,
    #[serde(default)]
    pub operations: Vec<OperationEntry>,
    #[serde(default)]
    pub cedear_prices: Vec<CedearPriceRecord>,
    #[serde(default)]
    pub dollar_rates: Vec<DollarRateEntry>,
}

/// Validated, in-memory ledger serving the repository trait.
#[derive(Debug, Default)]
pub struct JsonLedgerRepository {
    portfolios: Vec<PortfolioEntry>,
    operations: Vec<(Uuid, Operation)>,
    prices: Vec<CedearPriceRecord>,
    rates: Vec<FxRateRecord>,
}

impl JsonLedgerRepository {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ledger file {}", path.display()))?;
        let file: LedgerFile = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse ledger file {}", path.display()))?;
        Self::from_file(file)
    }

    pub fn from_file(file: LedgerFile) -> anyhow::Result<Self> {
        let mut operations = Vec::with_capacity(file.operations.len());
        for (index, entry) in file.operations.into_iter().enumerate() {
            if !file.portfolios.iter().any(|p| p.id == entry.portfolio_id) {
                bail!(
                    "operation #{} references unknown portfolio {}",
                    index,
                    entry.portfolio_id
                );
            }
            let operation = NewOperation {
                ticker: entry.ticker,
                quantity: entry.quantity,
                price_ars: entry.price_ars,
                fees_ars: entry.fees_ars,
                operation_date: entry.operation_date,
            }
            .validate()
            .with_context(|| format!("operation #{} is invalid", index))?;
            operations.push((entry.portfolio_id, operation));
        }

        let mut prices = file.cedear_prices;
        for (index, price) in prices.iter_mut().enumerate() {
            price.ticker = price.ticker.trim().to_string();
            price
                .validate()
                .with_context(|| format!("price #{} is invalid", index))?;
        }

        let mut rates = Vec::with_capacity(file.dollar_rates.len());
        for (index, entry) in file.dollar_rates.into_iter().enumerate() {
            let record = entry.into_record();
            record
                .validate()
                .with_context(|| format!("dollar rate #{} is invalid", index))?;
            rates.push(record);
        }

        tracing::debug!(
            "Loaded ledger: {} portfolios, {} operations, {} prices, {} dollar rates",
            file.portfolios.len(),
            operations.len(),
            prices.len(),
            rates.len()
        );

        Ok(Self {
            portfolios: file.portfolios,
            operations,
            prices,
            rates,
        })
    }

    /// Finds a portfolio by id or case-insensitive name. With no selector, the ledger
    /// must hold exactly one portfolio.
    pub fn resolve_portfolio(&self, selector: Option<&str>) -> anyhow::Result<&PortfolioEntry> {
        match selector {
            Some(selector) => {
                let by_id = Uuid::parse_str(selector).ok();
                self.portfolios
                    .iter()
                    .find(|p| Some(p.id) == by_id || p.name.eq_ignore_ascii_case(selector))
                    .ok_or_else(|| anyhow!("no portfolio matches '{}'", selector))
            }
            None => match self.portfolios.as_slice() {
                [only] => Ok(only),
                [] => bail!("ledger has no portfolios"),
                _ => bail!("ledger has several portfolios; pass --portfolio"),
            },
        }
    }
}

#[async_trait]
impl LedgerRepositoryTrait for JsonLedgerRepository {
    async fn portfolio_exists(&self, portfolio_id: Uuid) -> cedear_ledger_core::Result<bool> {
        Ok(self.portfolios.iter().any(|p| p.id == portfolio_id))
    }

    async fn get_operations(&self, portfolio_id: Uuid) -> cedear_ledger_core::Result<Vec<Operation>> {
        Ok(self
            .operations
            .iter()
            .filter(|(owner, _)| *owner == portfolio_id)
            .map(|(_, operation)| operation.clone())
            .collect())
    }

    async fn get_cedear_prices(
        &self,
        tickers: &[String],
    ) -> cedear_ledger_core::Result<Vec<CedearPriceRecord>> {
        Ok(self
            .prices
            .iter()
            .filter(|price| tickers.contains(&normalize_ticker(&price.ticker)))
            .cloned()
            .collect())
    }

    async fn get_dollar_rates(&self) -> cedear_ledger_core::Result<Vec<FxRateRecord>> {
        Ok(self.rates.clone())
    }
}
