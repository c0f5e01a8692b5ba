//! Pulls prices, news and earnings for the configured symbols into the raw
//! tables.

use crate::domain::ports::{EarningsDataService, MarketDataService, NewsDataService};
use crate::domain::repositories::RawMarketDataRepository;
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct IngestionSettings {
    pub symbols: Vec<String>,
    /// Yahoo chart range, e.g. `1mo`.
    pub price_range: String,
    pub news_days_back: i64,
}

/// Rows appended for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymbolIngestion {
    pub prices: usize,
    pub news: usize,
    pub earnings: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionReport {
    pub per_symbol: BTreeMap<String, SymbolIngestion>,
}

impl IngestionReport {
    pub fn totals(&self) -> SymbolIngestion {
        self.per_symbol
            .values()
            .fold(SymbolIngestion::default(), |acc, s| SymbolIngestion {
                prices: acc.prices + s.prices,
                news: acc.news + s.news,
                earnings: acc.earnings + s.earnings,
            })
    }
}

pub struct IngestionService {
    market_data: Arc<dyn MarketDataService>,
    news: Arc<dyn NewsDataService>,
    earnings: Arc<dyn EarningsDataService>,
    raw: Arc<dyn RawMarketDataRepository>,
}

impl IngestionService {
    pub fn new(
        market_data: Arc<dyn MarketDataService>,
        news: Arc<dyn NewsDataService>,
        earnings: Arc<dyn EarningsDataService>,
        raw: Arc<dyn RawMarketDataRepository>,
    ) -> Self {
        Self {
            market_data,
            news,
            earnings,
            raw,
        }
    }

    /// Ingests every symbol. Any provider or warehouse error aborts the run,
    /// the daily pipeline retries the whole stage.
    pub async fn run(&self, settings: &IngestionSettings, today: NaiveDate) -> Result<IngestionReport> {
        if settings.symbols.is_empty() {
            warn!("No symbols configured, nothing to ingest");
        }

        let mut report = IngestionReport::default();
        for symbol in &settings.symbols {
            let counts = self
                .ingest_symbol(symbol, settings, today)
                .await
                .with_context(|| format!("Ingestion failed for {}", symbol))?;
            info!(
                "{}: {} price rows, {} news rows, {} earnings rows",
                symbol, counts.prices, counts.news, counts.earnings
            );
            report.per_symbol.insert(symbol.clone(), counts);
        }

        let totals = report.totals();
        info!(
            "Ingestion complete: {} symbols, {} prices, {} news, {} earnings",
            report.per_symbol.len(),
            totals.prices,
            totals.news,
            totals.earnings
        );
        Ok(report)
    }

    async fn ingest_symbol(
        &self,
        symbol: &str,
        settings: &IngestionSettings,
        today: NaiveDate,
    ) -> Result<SymbolIngestion> {
        let (bars, payload) = self
            .market_data
            .get_daily_bars(symbol, &settings.price_range)
            .await?;
        let prices = self.raw.save_prices(&bars, &payload).await?;

        let from = today - Duration::days(settings.news_days_back);
        let articles = self.news.get_company_news(symbol, from, today).await?;
        let news = self.raw.save_news(&articles).await?;

        let reports = self.earnings.get_earnings(symbol).await?;
        let earnings = self.raw.save_earnings(&reports).await?;

        Ok(SymbolIngestion {
            prices,
            news,
            earnings,
        })
    }
}
