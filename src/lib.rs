pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::{AppConfig, RebalanceOverrides};
use crate::providers::yahoo_finance::{YahooCurrencyProvider, YahooFinanceProvider};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

pub enum AppCommand {
    /// Plan purchases for the configured cash injection
    Rebalance(RebalanceOverrides),
    /// Report real-estate exposure of the target allocation
    Exposure { target_path: Option<PathBuf> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("rebal starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let base_url = config.providers.yahoo_base_url();
    let symbol_provider = YahooFinanceProvider::new(base_url);

    match command {
        AppCommand::Rebalance(overrides) => {
            let rebalance_config = config.rebalance.clone().apply(overrides);
            let currency_provider = YahooCurrencyProvider::new(base_url);
            cli::rebalance::run(&rebalance_config, &symbol_provider, &currency_provider).await
        }
        AppCommand::Exposure { target_path } => {
            let target_path = target_path.unwrap_or_else(|| config.rebalance.target_path.clone());
            cli::exposure::run(&target_path, &symbol_provider).await
        }
    }
}
