//! Market snapshot: one quote per symbol plus the USD/TWD rate.
//!
//! The fetch is all-or-nothing. Every symbol that cannot be priced, including
//! quotes in a currency other than USD or TWD, is collected and reported in a
//! single error; no partial snapshot is returned.

use crate::core::currency::{Currency, CurrencyRateProvider, to_base, to_reporting};
use crate::core::error::{RebalanceError, Result};
use crate::core::price::PriceProvider;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::debug;

/// Quote symbol of the exchange rate.
pub const FX_SYMBOL: &str = "USDTWD=X";

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub currency: Currency,
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    quotes: BTreeMap<String, Quote>,
    /// TWD per USD.
    pub usd_twd: f64,
}

impl MarketSnapshot {
    pub fn new(quotes: BTreeMap<String, Quote>, usd_twd: f64) -> Self {
        Self { quotes, usd_twd }
    }

    pub fn quote(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(symbol)
    }

    pub fn price_in_base(&self, quote: &Quote) -> f64 {
        to_base(quote.price, quote.currency, self.usd_twd)
    }

    pub fn price_in_reporting(&self, quote: &Quote) -> f64 {
        to_reporting(quote.price, quote.currency, self.usd_twd)
    }

    /// Most recent close time across all quotes.
    pub fn latest_as_of(&self) -> Option<DateTime<Utc>> {
        self.quotes.values().filter_map(|q| q.as_of).max()
    }
}

fn usable(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Fetches every symbol and the exchange rate concurrently, in one attempt.
///
/// `on_progress` is invoked once per completed request.
pub async fn fetch_snapshot(
    symbols: &[String],
    price_provider: &(dyn PriceProvider + Send + Sync),
    currency_provider: &(dyn CurrencyRateProvider + Send + Sync),
    on_progress: &(dyn Fn() + Sync),
) -> Result<MarketSnapshot> {
    let rate_future = async {
        let rate = currency_provider
            .get_rate(Currency::Usd.code(), Currency::Twd.code())
            .await;
        on_progress();
        rate
    };
    let price_futures = symbols.iter().map(|symbol| async move {
        let res = price_provider.fetch_price(symbol).await;
        on_progress();
        (symbol, res)
    });
    let (rate, prices) = futures::join!(rate_future, join_all(price_futures));

    let mut missing = Vec::new();
    let usd_twd = match rate {
        Ok(rate) if usable(rate) => Some(rate),
        Ok(rate) => {
            debug!(rate, "Discarding unusable exchange rate");
            None
        }
        Err(e) => {
            debug!(error = %e, "Exchange rate fetch failed");
            None
        }
    };
    if usd_twd.is_none() {
        missing.push(format!("{FX_SYMBOL} (forex rate)"));
    }

    let mut quotes = BTreeMap::new();
    for (symbol, res) in prices {
        match res {
            Ok(p) if usable(p.price) => match Currency::resolve(symbol, p.currency.as_deref()) {
                Ok(currency) => {
                    debug!(%symbol, price = p.price, %currency, "Priced symbol");
                    quotes.insert(
                        symbol.clone(),
                        Quote {
                            price: p.price,
                            currency,
                            as_of: p.as_of,
                        },
                    );
                }
                Err(RebalanceError::UnsupportedCurrency { code, .. }) => {
                    debug!(%symbol, %code, "Discarding quote in unsupported currency");
                    missing.push(format!("{symbol} (unsupported currency {code})"));
                }
                Err(e) => return Err(e),
            },
            Ok(p) => {
                debug!(%symbol, price = p.price, "Discarding unusable price");
                missing.push(symbol.clone());
            }
            Err(e) => {
                debug!(%symbol, error = %e, "Price fetch failed");
                missing.push(symbol.clone());
            }
        }
    }

    match usd_twd {
        Some(usd_twd) if missing.is_empty() => Ok(MarketSnapshot::new(quotes, usd_twd)),
        _ => Err(RebalanceError::DataUnavailable { symbols: missing }),
    }
}
