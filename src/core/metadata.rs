use async_trait::async_trait;

/// Free-text descriptors of a listed instrument.
#[derive(Debug, Clone, Default)]
pub struct QuoteMetadata {
    pub symbol: String,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub instrument_type: Option<String>,
    pub exchange_name: Option<String>,
}

impl QuoteMetadata {
    /// All descriptors joined and lower-cased, for substring matching.
    pub fn searchable_text(&self) -> String {
        [
            &self.long_name,
            &self.short_name,
            &self.instrument_type,
            &self.exchange_name,
        ]
        .into_iter()
        .flatten()
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch_metadata(&self, symbol: &str) -> anyhow::Result<QuoteMetadata>;
}
