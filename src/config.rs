use anyhow::{Context, Result};
use clap::Parser;
use std::{fs, path::PathBuf, time::Duration};

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const APP_DIR: &str = "stock-watchlist";

/// Terminal stock watchlist backed by a quote/history/prediction API
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Base URL of the market data API
    #[arg(long, env = "WATCHLIST_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Directory holding the persisted watchlist
    #[arg(long, env = "WATCHLIST_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Where log output goes (the terminal belongs to the UI)
    #[arg(long, env = "WATCHLIST_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub timeout: Duration,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;

        let log_file = cli.log_file.unwrap_or_else(|| default_cache_dir().join("watchlist.log"));
        if let Some(parent) = log_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {}", parent.display()))?;
        }

        Ok(Config {
            api_url: cli.api_url.trim_end_matches('/').to_string(),
            data_dir,
            log_file,
            timeout: Duration::from_secs(cli.timeout_secs.max(1)),
        })
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("stocks.json")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_default()
        .join(APP_DIR)
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}
