//! Holdings and target allocation documents.
//!
//! Both are flat JSON objects keyed by ticker symbol. They are loaded once per
//! run and never mutated afterwards.

use crate::core::error::{RebalanceError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Allowed distance of the target weight sum from 1.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Owned share count per symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Holdings(BTreeMap<String, f64>);

/// Desired fraction of total capital per symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetAllocation(BTreeMap<String, f64>);

fn read_object(path: &Path) -> Result<BTreeMap<String, f64>> {
    let contents = fs::read_to_string(path).map_err(|e| RebalanceError::InputRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&contents).map_err(|e| RebalanceError::InputParse {
        path: path.to_path_buf(),
        source: e,
    })
}

impl Holdings {
    pub fn load(path: &Path) -> Result<Self> {
        let holdings = Self::new(read_object(path)?)?;
        debug!(path = %path.display(), count = holdings.0.len(), "Loaded holdings");
        Ok(holdings)
    }

    pub fn new(quantities: BTreeMap<String, f64>) -> Result<Self> {
        for (symbol, qty) in &quantities {
            if !qty.is_finite() || *qty < 0.0 {
                return Err(RebalanceError::Input(format!(
                    "holding for {symbol} must be a non-negative number, got {qty}"
                )));
            }
        }
        Ok(Holdings(quantities))
    }

    /// Owned quantity, 0 when the symbol is not held.
    pub fn quantity(&self, symbol: &str) -> f64 {
        self.0.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

impl TargetAllocation {
    pub fn load(path: &Path) -> Result<Self> {
        let target = Self::new(read_object(path)?)?;
        debug!(path = %path.display(), count = target.0.len(), "Loaded target allocation");
        Ok(target)
    }

    pub fn new(weights: BTreeMap<String, f64>) -> Result<Self> {
        for (symbol, weight) in &weights {
            if !weight.is_finite() || !(0.0..=1.0).contains(weight) {
                return Err(RebalanceError::Input(format!(
                    "target weight for {symbol} must be within [0, 1], got {weight}"
                )));
            }
        }

        let sum: f64 = weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(RebalanceError::Input(format!(
                "target weights must sum to 1, got {sum:.6}"
            )));
        }
        Ok(TargetAllocation(weights))
    }

    /// Target weight, 0 when the symbol is not targeted.
    pub fn weight(&self, symbol: &str) -> f64 {
        self.0.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

/// Sorted union of held and targeted symbols.
pub fn symbol_universe(holdings: &Holdings, target: &TargetAllocation) -> Vec<String> {
    holdings
        .symbols()
        .chain(target.symbols())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
