//! Core business logic abstractions

pub mod allocation;
pub mod config;
pub mod currency;
pub mod error;
pub mod exposure;
pub mod log;
pub mod market;
pub mod metadata;
pub mod price;
pub mod rebalance;
pub mod report;

// Re-export main types for cleaner imports
pub use currency::{Currency, CurrencyRateProvider};
pub use error::RebalanceError;
pub use metadata::{MetadataProvider, QuoteMetadata};
pub use price::{PriceProvider, PriceResult};
