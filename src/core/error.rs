//! Error taxonomy for a rebalance run.

use std::path::PathBuf;

/// Every failure that aborts a rebalance run. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum RebalanceError {
    #[error("failed to read {path}: {source}")]
    InputRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    InputParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid input: {0}")]
    Input(String),

    #[error("unable to fetch prices for: {}", .symbols.join(", "))]
    DataUnavailable { symbols: Vec<String> },

    #[error("unsupported currency {code} reported for {symbol}")]
    UnsupportedCurrency { symbol: String, code: String },

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RebalanceError {
    /// True for errors raised while loading or validating local inputs.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RebalanceError::InputRead { .. }
                | RebalanceError::InputParse { .. }
                | RebalanceError::Input(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RebalanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_unavailable_lists_every_symbol() {
        let err = RebalanceError::DataUnavailable {
            symbols: vec!["USDTWD=X (forex rate)".to_string(), "VTI".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unable to fetch prices for: USDTWD=X (forex rate), VTI"
        );
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_input_errors_are_classified() {
        assert!(RebalanceError::Input("bad".to_string()).is_input_error());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = RebalanceError::InputRead {
            path: PathBuf::from("holdings.json"),
            source: io,
        };
        assert!(err.is_input_error());
        assert!(err.to_string().starts_with("failed to read holdings.json"));
    }
}
