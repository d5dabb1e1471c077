use std::sync::Arc;

use anyhow::Context;
use cedear_ledger_core::summary::{PortfolioSummaryService, PortfolioSummaryServiceTrait};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, LogFormat};
use crate::ledger_file::JsonLedgerRepository;

pub fn init_tracing(log_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays clean for reports.
    match log_format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

pub struct AppState {
    pub repository: Arc<JsonLedgerRepository>,
    pub summary_service: Arc<dyn PortfolioSummaryServiceTrait>,
}

pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    tracing::info!("Ledger file in use: {}", config.data_file.display());
    let repository = Arc::new(
        JsonLedgerRepository::load(&config.data_file).context("failed to load ledger")?,
    );
    let summary_service: Arc<dyn PortfolioSummaryServiceTrait> =
        Arc::new(PortfolioSummaryService::new(repository.clone()));
    Ok(AppState {
        repository,
        summary_service,
    })
}
