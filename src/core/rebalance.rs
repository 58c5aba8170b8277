//! Turns holdings, target weights and a cash injection into buy orders.
//!
//! All values are normalized to TWD before any comparison. Orders are always
//! rounded down to whole shares, so a plan never spends more than the gap
//! between a symbol's target value and its held value.
//!
//! Targets are taken against total capital and nothing is ever sold. When a
//! holding sits above its target, the other symbols' gaps add up to more than
//! the injected cash and the leftover cash goes negative.

use crate::core::allocation::{Holdings, TargetAllocation, symbol_universe};
use crate::core::config::RebalanceConfig;
use crate::core::currency::Currency;
use crate::core::error::{RebalanceError, Result};
use crate::core::market::MarketSnapshot;
use tracing::debug;

/// One line of the plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRow {
    pub symbol: String,
    /// Price in the quote's own currency.
    pub price: f64,
    pub currency: Currency,
    pub price_base: f64,
    pub owned: f64,
    pub target_weight: f64,
    pub buy: u64,
    pub cost_base: f64,
}

impl PlanRow {
    pub fn display_price(&self) -> String {
        format!("{:.2} {}", self.price, self.currency)
    }
}

#[derive(Debug, Clone)]
pub struct RebalancePlan {
    /// Every symbol held or targeted, sorted by symbol.
    pub rows: Vec<PlanRow>,
    pub current_value: f64,
    pub cash_injection: f64,
    pub total_capital: f64,
    pub usd_twd: f64,
}

impl RebalancePlan {
    /// Rows to display and persist as orders.
    pub fn visible_rows(&self, show_zero: bool) -> impl Iterator<Item = &PlanRow> {
        self.rows.iter().filter(move |r| show_zero || r.buy > 0)
    }

    pub fn total_cost(&self) -> f64 {
        self.rows.iter().map(|r| r.cost_base).sum()
    }

    pub fn leftover_cash(&self) -> f64 {
        self.cash_injection - self.total_cost()
    }
}

/// Shares of a `price_base` instrument needed to close `gap`, rounded down.
fn shares_for_gap(gap: f64, price_base: f64) -> u64 {
    if gap <= 0.0 {
        0
    } else {
        (gap / price_base).floor() as u64
    }
}

pub fn compute_plan(
    config: &RebalanceConfig,
    holdings: &Holdings,
    target: &TargetAllocation,
    snapshot: &MarketSnapshot,
) -> Result<RebalancePlan> {
    let symbols = symbol_universe(holdings, target);

    let missing: Vec<String> = symbols
        .iter()
        .filter(|s| snapshot.quote(s).is_none())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(RebalanceError::DataUnavailable { symbols: missing });
    }

    let mut current_value = 0.0;
    for (symbol, qty) in holdings.iter() {
        if let Some(quote) = snapshot.quote(symbol) {
            current_value += qty * snapshot.price_in_base(quote);
        }
    }
    let total_capital = current_value + config.cash_injection;
    debug!(current_value, total_capital, "Computed portfolio capital");

    let mut rows = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let Some(quote) = snapshot.quote(&symbol) else {
            continue;
        };
        let price_base = snapshot.price_in_base(quote);
        let owned = holdings.quantity(&symbol);
        let target_weight = target.weight(&symbol);

        let target_value = target_weight * total_capital;
        let held_value = owned * price_base;
        let gap = target_value - held_value;
        let buy = shares_for_gap(gap, price_base);
        debug!(%symbol, target_value, held_value, gap, buy, "Planned symbol");

        rows.push(PlanRow {
            price: quote.price,
            currency: quote.currency,
            price_base,
            owned,
            target_weight,
            buy,
            cost_base: buy as f64 * price_base,
            symbol,
        });
    }

    Ok(RebalancePlan {
        rows,
        current_value,
        cash_injection: config.cash_injection,
        total_capital,
        usd_twd: snapshot.usd_twd,
    })
}
