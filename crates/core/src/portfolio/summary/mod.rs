//! Portfolio summary - the MEP/CCL cost and valuation engine and the service around it.

pub mod calculation_engine;
mod summary_model;
mod summary_service;
mod summary_traits;


pub use calculation_engine::{
    build_portfolio_totals, build_ticker_summary, calculate_portfolio_summary,
};
pub use summary_model::*;
pub use summary_service::{PortfolioSummaryService, PortfolioSummaryServiceTrait};
pub use summary_traits::LedgerRepositoryTrait;
