//! Currency conversion abstractions

use crate::core::error::RebalanceError;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// The two currencies a portfolio may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "TWD")]
    Twd,
}

impl Currency {
    /// Currency all rebalancing math is done in.
    pub const BASE: Currency = Currency::Twd;
    /// Currency used by the persisted valuation report.
    pub const REPORTING: Currency = Currency::Usd;

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Twd => "TWD",
        }
    }

    /// Naming convention used when the quote source does not report a currency:
    /// Taiwan listings carry a `.TW` suffix, everything else trades in USD.
    pub fn from_symbol(symbol: &str) -> Currency {
        if symbol.ends_with(".TW") {
            Currency::Twd
        } else {
            Currency::Usd
        }
    }

    /// Picks the quote currency for `symbol`, preferring the code reported by
    /// the quote source. Codes outside the enum are rejected.
    pub fn resolve(symbol: &str, reported: Option<&str>) -> Result<Currency, RebalanceError> {
        match reported.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => code
                .parse::<Currency>()
                .map_err(|_| RebalanceError::UnsupportedCurrency {
                    symbol: symbol.to_string(),
                    code: code.to_string(),
                }),
            None => Ok(Currency::from_symbol(symbol)),
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "TWD" => Ok(Currency::Twd),
            _ => Err(anyhow::anyhow!("Invalid currency: {}", s)),
        }
    }
}

/// Converts a price quoted in `currency` into the base currency (TWD).
pub fn to_base(price: f64, currency: Currency, usd_twd: f64) -> f64 {
    match currency {
        Currency::Usd => price * usd_twd,
        Currency::Twd => price,
    }
}

/// Converts a price quoted in `currency` into the reporting currency (USD).
pub fn to_reporting(price: f64, currency: Currency, usd_twd: f64) -> f64 {
    match currency {
        Currency::Usd => price,
        Currency::Twd => price / usd_twd,
    }
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Units of `to` per one unit of `from`.
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}
