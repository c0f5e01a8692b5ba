use crate::domain::types::{EarningsReport, NewsArticle, PriceBar};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Daily price bars for one symbol.
#[async_trait]
pub trait MarketDataService: Send + Sync {
    /// Returns the bars plus the untouched provider payload, which is kept
    /// alongside every bar in the raw table.
    async fn get_daily_bars(
        &self,
        symbol: &str,
        range: &str,
    ) -> Result<(Vec<PriceBar>, serde_json::Value)>;
}

#[async_trait]
pub trait NewsDataService: Send + Sync {
    async fn get_company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsArticle>>;
}

#[async_trait]
pub trait EarningsDataService: Send + Sync {
    async fn get_earnings(&self, symbol: &str) -> Result<Vec<EarningsReport>>;
}
