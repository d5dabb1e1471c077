use std::path::PathBuf;

use anyhow::anyhow;
use cedear_ledger_cli::config::{Config, OutputFormat};
use cedear_ledger_cli::main_lib::{build_state, init_tracing};
use cedear_ledger_cli::output::{print_json, render_summary_table, render_valuation_table};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cedear-ledger")]
#[command(about = "Cost basis and MEP/CCL valuation of CEDEAR portfolios")]
struct Cli {
    /// Ledger snapshot to read (overrides CEDEAR_DATA_FILE)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Output format: json or table (overrides CEDEAR_OUTPUT)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-ticker and portfolio cost, value and P&L in ARS, USD MEP and USD CCL
    Summary {
        /// Portfolio id or name; optional when the ledger holds a single portfolio
        #[arg(long)]
        portfolio: Option<String>,
        /// Also list every operation with the rates used to convert it
        #[arg(long)]
        operations: bool,
    },
    /// Open positions at average cost, marked at the latest price
    Valuation {
        #[arg(long)]
        portfolio: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(data_file) = cli.data_file {
        config.data_file = data_file;
    }
    if let Some(output) = cli.output {
        config.output = output;
    }
    init_tracing(config.log_format);

    let state = build_state(&config)?;

    match cli.command {
        Commands::Summary {
            portfolio,
            operations,
        } => {
            let entry = state.repository.resolve_portfolio(portfolio.as_deref())?;
            let summary = state
                .summary_service
                .get_summary(entry.id)
                .await?
                .ok_or_else(|| anyhow!("portfolio {} not found", entry.id))?;
            match config.output {
                OutputFormat::Json => print_json(&summary)?,
                OutputFormat::Table => println!("{}", render_summary_table(&summary, operations)),
            }
        }
        Commands::Valuation { portfolio } => {
            let entry = state.repository.resolve_portfolio(portfolio.as_deref())?;
            let valuation = state
                .summary_service
                .get_valuation(entry.id, chrono::Utc::now())
                .await?;
            match config.output {
                OutputFormat::Json => print_json(&valuation)?,
                OutputFormat::Table => println!("{}", render_valuation_table(&valuation)),
            }
        }
    }

    Ok(())
}
