//! Persisted artifacts of a rebalance run: the buy-order map and the USD
//! valuation report. Both are keyed by symbol in sorted order so identical
//! inputs produce byte-identical files.

use crate::core::currency::{Currency, to_reporting};
use crate::core::error::{RebalanceError, Result};
use crate::core::rebalance::RebalancePlan;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Symbol to whole shares to purchase. Follows the display filter, so zero
/// orders are only present when `show_zero` is set.
pub fn buy_orders(plan: &RebalancePlan, show_zero: bool) -> BTreeMap<String, u64> {
    plan.visible_rows(show_zero)
        .map(|r| (r.symbol.clone(), r.buy))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationSummary {
    pub orig_total_usd: f64,
    pub new_total_usd: f64,
}

/// Whole share counts are written as JSON integers; fractional holdings keep
/// their decimals.
fn serialize_quantity<S: Serializer>(
    qty: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if qty.fract() == 0.0 && (0.0..=u64::MAX as f64).contains(qty) {
        serializer.serialize_u64(*qty as u64)
    } else {
        serializer.serialize_f64(*qty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionValuation {
    #[serde(serialize_with = "serialize_quantity")]
    pub orig_qty: f64,
    pub orig_price_usd: f64,
    pub orig_value_usd: f64,
    #[serde(serialize_with = "serialize_quantity")]
    pub new_qty: f64,
    pub new_price_usd: f64,
    pub new_value_usd: f64,
    pub currency: Currency,
}

/// Portfolio before and after the planned purchases, valued in USD.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationReport {
    pub summary: ValuationSummary,
    pub positions: BTreeMap<String, PositionValuation>,
}

impl ValuationReport {
    /// Covers every symbol of the plan, regardless of the display filter.
    pub fn from_plan(plan: &RebalancePlan) -> Self {
        let mut positions = BTreeMap::new();
        let mut orig_total = 0.0;
        let mut new_total = 0.0;

        for row in &plan.rows {
            let price_usd = to_reporting(row.price, row.currency, plan.usd_twd);
            let new_qty = row.owned + row.buy as f64;
            let orig_value = row.owned * price_usd;
            let new_value = new_qty * price_usd;
            orig_total += orig_value;
            new_total += new_value;

            positions.insert(
                row.symbol.clone(),
                PositionValuation {
                    orig_qty: row.owned,
                    orig_price_usd: round2(price_usd),
                    orig_value_usd: round2(orig_value),
                    new_qty,
                    new_price_usd: round2(price_usd),
                    new_value_usd: round2(new_value),
                    currency: row.currency,
                },
            );
        }

        ValuationReport {
            summary: ValuationSummary {
                orig_total_usd: round2(orig_total),
                new_total_usd: round2(new_total),
            },
            positions,
        }
    }
}

/// A pretty-printed JSON file that has not been written yet.
#[derive(Debug, Clone)]
pub struct JsonOutput {
    path: PathBuf,
    json: String,
}

impl JsonOutput {
    pub fn new<T: Serialize>(path: &Path, value: &T) -> Result<Self> {
        let json = serde_json::to_string_pretty(value).map_err(|e| RebalanceError::Output {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            json,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Overwrites every output, or none of them.
///
/// Each file is first written next to its destination and only renamed into
/// place once all of them are on disk. A failed write removes the staged
/// files and leaves existing outputs untouched.
pub fn write_outputs(outputs: &[JsonOutput]) -> Result<()> {
    let mut staged = Vec::with_capacity(outputs.len());
    for output in outputs {
        let tmp = staging_path(&output.path);
        if let Err(source) = fs::write(&tmp, &output.json) {
            for path in &staged {
                let _ = fs::remove_file(path);
            }
            return Err(RebalanceError::Output {
                path: output.path.clone(),
                source,
            });
        }
        staged.push(tmp);
    }

    for (output, tmp) in outputs.iter().zip(&staged) {
        fs::rename(tmp, &output.path).map_err(|source| RebalanceError::Output {
            path: output.path.clone(),
            source,
        })?;
        debug!("Wrote {}", output.path.display());
    }
    Ok(())
}
