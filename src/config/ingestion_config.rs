//! Market data source settings.

use super::{parse_env, string_env};
use crate::application::ingestion::IngestionSettings;
use crate::domain::errors::ConfigError;
use std::env;

pub const DEFAULT_SYMBOLS: [&str; 4] = ["AAPL", "MSFT", "GOOGL", "AMZN"];

#[derive(Debug, Clone)]
pub struct IngestionEnvConfig {
    pub finnhub_api_key: String,
    pub finnhub_base_url: String,
    pub yahoo_base_url: String,
    pub symbols: Vec<String>,
    pub news_days_back: i64,
    pub price_range: String,
}

impl Default for IngestionEnvConfig {
    fn default() -> Self {
        Self {
            finnhub_api_key: String::new(),
            finnhub_base_url: "https://finnhub.io/api/v1".to_string(),
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            news_days_back: 30,
            price_range: "1mo".to_string(),
        }
    }
}

impl IngestionEnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let symbols = match env::var("SYMBOLS") {
            Ok(list) if !list.trim().is_empty() => parse_symbols(&list),
            _ => defaults.symbols,
        };

        Ok(Self {
            finnhub_api_key: env::var("FINNHUB_API_KEY").unwrap_or_default(),
            finnhub_base_url: string_env("FINNHUB_BASE_URL", &defaults.finnhub_base_url),
            yahoo_base_url: string_env("YAHOO_BASE_URL", &defaults.yahoo_base_url),
            symbols,
            news_days_back: parse_env("NEWS_DAYS_BACK", defaults.news_days_back)?,
            price_range: string_env("PRICE_RANGE", &defaults.price_range),
        })
    }

    /// The key is only needed by the ingestion stage.
    pub fn require_finnhub_key(&self) -> Result<&str, ConfigError> {
        if self.finnhub_api_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "FINNHUB_API_KEY".to_string(),
            });
        }
        Ok(&self.finnhub_api_key)
    }

    pub fn settings(&self) -> IngestionSettings {
        IngestionSettings {
            symbols: self.symbols.clone(),
            price_range: self.price_range.clone(),
            news_days_back: self.news_days_back,
        }
    }
}

/// Comma separated, trimmed, upper-cased, empties dropped.
fn parse_symbols(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
