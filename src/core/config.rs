use crate::core::error::RebalanceError;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Inputs of one rebalance run.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RebalanceConfig {
    /// New cash to invest, in TWD.
    pub cash_injection: f64,
    pub holdings_path: PathBuf,
    pub target_path: PathBuf,
    /// Also list (and persist) symbols that need no purchase.
    pub show_zero_rows: bool,
    pub to_buy_path: PathBuf,
    pub report_path: PathBuf,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        RebalanceConfig {
            cash_injection: 4_000_000.0,
            holdings_path: PathBuf::from("holdings.json"),
            target_path: PathBuf::from("target_alloc.json"),
            show_zero_rows: false,
            to_buy_path: PathBuf::from("to_buy.json"),
            report_path: PathBuf::from("report.json"),
        }
    }
}

/// Command line overrides for [`RebalanceConfig`].
#[derive(Debug, Clone, Default)]
pub struct RebalanceOverrides {
    pub cash_injection: Option<f64>,
    pub show_zero_rows: bool,
    pub holdings_path: Option<PathBuf>,
    pub target_path: Option<PathBuf>,
}

impl RebalanceConfig {
    pub fn apply(mut self, overrides: RebalanceOverrides) -> Self {
        if let Some(cash) = overrides.cash_injection {
            self.cash_injection = cash;
        }
        if overrides.show_zero_rows {
            self.show_zero_rows = true;
        }
        if let Some(path) = overrides.holdings_path {
            self.holdings_path = path;
        }
        if let Some(path) = overrides.target_path {
            self.target_path = path;
        }
        self
    }

    pub fn validate(&self) -> Result<(), RebalanceError> {
        if !self.cash_injection.is_finite() || self.cash_injection < 0.0 {
            return Err(RebalanceError::Input(format!(
                "cash injection must be a non-negative amount, got {}",
                self.cash_injection
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

impl ProvidersConfig {
    pub fn yahoo_base_url(&self) -> &str {
        self.yahoo
            .as_ref()
            .map_or("https://query1.finance.yahoo.com", |p| &p.base_url)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub rebalance: RebalanceConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults when there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("tw", "rebal", "rebal")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
