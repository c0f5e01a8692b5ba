use crate::domain::ports::{EarningsDataService, MarketDataService, NewsDataService};
use crate::domain::types::{EarningsReport, NewsArticle, PriceBar};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Price source serving canned bars per symbol.
#[derive(Clone, Default)]
pub struct MockMarketDataService {
    bars: Arc<RwLock<HashMap<String, (Vec<PriceBar>, serde_json::Value)>>>,
    failing: Arc<RwLock<HashSet<String>>>,
}

impl MockMarketDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_bars(&self, symbol: &str, bars: Vec<PriceBar>, payload: serde_json::Value) {
        self.bars
            .write()
            .await
            .insert(symbol.to_string(), (bars, payload));
    }

    /// Every request for `symbol` fails from now on.
    pub async fn fail_for(&self, symbol: &str) {
        self.failing.write().await.insert(symbol.to_string());
    }
}

#[async_trait]
impl MarketDataService for MockMarketDataService {
    async fn get_daily_bars(
        &self,
        symbol: &str,
        range: &str,
    ) -> Result<(Vec<PriceBar>, serde_json::Value)> {
        if self.failing.read().await.contains(symbol) {
            anyhow::bail!("Mock price source unavailable for {}", symbol);
        }
        debug!("MockMarketDataService: bars for {} ({})", symbol, range);
        Ok(self
            .bars
            .read()
            .await
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| (Vec::new(), serde_json::Value::Null)))
    }
}

#[derive(Clone, Default)]
pub struct MockNewsService {
    articles: Arc<RwLock<Vec<NewsArticle>>>,
}

impl MockNewsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_article(&self, article: NewsArticle) {
        self.articles.write().await.push(article);
    }
}

#[async_trait]
impl NewsDataService for MockNewsService {
    async fn get_company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsArticle>> {
        Ok(self
            .articles
            .read()
            .await
            .iter()
            .filter(|a| a.symbol == symbol)
            .filter(|a| {
                let day = a.published_at.date_naive();
                day >= from && day <= to
            })
            .cloned()
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct MockEarningsService {
    reports: Arc<RwLock<Vec<EarningsReport>>>,
}

impl MockEarningsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_report(&self, report: EarningsReport) {
        self.reports.write().await.push(report);
    }
}

#[async_trait]
impl EarningsDataService for MockEarningsService {
    async fn get_earnings(&self, symbol: &str) -> Result<Vec<EarningsReport>> {
        Ok(self
            .reports
            .read()
            .await
            .iter()
            .filter(|r| r.symbol == symbol)
            .cloned()
            .collect())
    }
}
