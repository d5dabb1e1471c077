use std::path::PathBuf;
use std::str::FromStr;

/// Default ledger snapshot location when `CEDEAR_DATA_FILE` is unset.
pub const DEFAULT_DATA_FILE: &str = "ledger.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("json") {
            Ok(OutputFormat::Json)
        } else if value.eq_ignore_ascii_case("table") {
            Ok(OutputFormat::Table)
        } else {
            Err(format!("unknown output format '{}' (expected json or table)", value))
        }
    }
}

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_file: PathBuf,
    pub log_format: LogFormat,
    pub output: OutputFormat,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unknown values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_file = lookup("CEDEAR_DATA_FILE")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));

        let log_format = match lookup("CEDEAR_LOG_FORMAT") {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let output = lookup("CEDEAR_OUTPUT")
            .and_then(|value| value.parse().ok())
            .unwrap_or(OutputFormat::Json);

        Self {
            data_file,
            log_format,
            output,
        }
    }
}
