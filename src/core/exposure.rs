//! Real-estate exposure of a target allocation.

use crate::core::allocation::TargetAllocation;
use crate::core::metadata::{MetadataProvider, QuoteMetadata};
use futures::future::join_all;
use tracing::{debug, warn};

const REAL_ESTATE_MARKERS: [&str; 2] = ["reit", "real estate"];

pub fn is_real_estate(metadata: &QuoteMetadata) -> bool {
    let text = metadata.searchable_text();
    REAL_ESTATE_MARKERS.iter().any(|m| text.contains(m))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExposureReport {
    /// Tickers classified as real estate, sorted.
    pub tickers: Vec<String>,
    /// Combined target weight of `tickers`.
    pub ratio: f64,
    /// Tickers whose metadata could not be fetched, with the reason.
    pub skipped: Vec<(String, String)>,
}

/// Classifies every targeted ticker. Fetch failures are logged and the ticker
/// is left out of both the list and the ratio.
pub async fn compute_exposure(
    target: &TargetAllocation,
    provider: &(dyn MetadataProvider + Send + Sync),
) -> ExposureReport {
    let futures = target.iter().map(|(symbol, weight)| async move {
        (symbol, *weight, provider.fetch_metadata(symbol).await)
    });

    let mut report = ExposureReport::default();
    for (symbol, weight, res) in join_all(futures).await {
        match res {
            Ok(metadata) => {
                if is_real_estate(&metadata) {
                    debug!(%symbol, weight, "Classified as real estate");
                    report.tickers.push(symbol.clone());
                    report.ratio += weight;
                }
            }
            Err(e) => {
                warn!(%symbol, error = %e, "Could not fetch info, skipping");
                report.skipped.push((symbol.clone(), e.to_string()));
            }
        }
    }
    report
}
