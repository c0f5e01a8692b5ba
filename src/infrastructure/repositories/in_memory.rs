//! In-Memory Repository Implementations
//!
//! Thread-safe, in-memory implementations of the warehouse traits defined in
//! `domain::repositories`. They back the unit and integration tests and let
//! the pipeline run without a database file.
//!
//! Data is lost when the process exits.

use crate::domain::repositories::{
    FeatureRepository, MetricsRepository, PredictionRepository, RawMarketDataRepository,
    ReportRepository,
};
use crate::domain::types::{
    EarningsReport, EvaluationRecord, FeatureRow, ModelMetricsRow, NewsArticle, PredictionRecord,
    PredictionWithQc, PriceBar,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory feature table
#[derive(Clone, Default)]
pub struct InMemoryFeatureRepository {
    rows: Arc<RwLock<Vec<FeatureRow>>>,
}

impl InMemoryFeatureRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<FeatureRow>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }
}

#[async_trait]
impl FeatureRepository for InMemoryFeatureRepository {
    async fn load_features(&self, lookback_days: i64) -> Result<Vec<FeatureRow>> {
        let rows = self.rows.read().await;
        let Some(latest) = rows.iter().map(|r| r.date).max() else {
            return Ok(Vec::new());
        };
        let start = latest - Duration::days(lookback_days);

        let mut selected: Vec<FeatureRow> =
            rows.iter().filter(|r| r.date >= start).cloned().collect();
        selected.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date)));
        Ok(selected)
    }

    async fn replace_all(&self, rows: &[FeatureRow]) -> Result<usize> {
        *self.rows.write().await = rows.to_vec();
        Ok(rows.len())
    }
}

/// In-memory metrics log. Each row is stamped with the append time.
#[derive(Clone, Default)]
pub struct InMemoryMetricsRepository {
    records: Arc<RwLock<Vec<(NaiveDateTime, EvaluationRecord)>>>,
}

impl InMemoryMetricsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<EvaluationRecord> {
        self.records
            .read()
            .await
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[async_trait]
impl MetricsRepository for InMemoryMetricsRepository {
    async fn append(&self, records: &[EvaluationRecord]) -> Result<usize> {
        let trained_at = Utc::now().naive_utc();
        self.records
            .write()
            .await
            .extend(records.iter().map(|r| (trained_at, r.clone())));
        Ok(records.len())
    }
}

/// In-memory prediction log
#[derive(Clone, Default)]
pub struct InMemoryPredictionRepository {
    records: Arc<RwLock<Vec<PredictionRecord>>>,
}

impl InMemoryPredictionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<PredictionRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl PredictionRepository for InMemoryPredictionRepository {
    async fn append(&self, records: &[PredictionRecord]) -> Result<usize> {
        self.records.write().await.extend_from_slice(records);
        Ok(records.len())
    }
}

/// In-memory raw ingestion tables
#[derive(Clone, Default)]
pub struct InMemoryRawMarketDataRepository {
    prices: Arc<RwLock<Vec<PriceBar>>>,
    news: Arc<RwLock<Vec<NewsArticle>>>,
    earnings: Arc<RwLock<Vec<EarningsReport>>>,
}

impl InMemoryRawMarketDataRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RawMarketDataRepository for InMemoryRawMarketDataRepository {
    async fn save_prices(&self, bars: &[PriceBar], _raw_payload: &serde_json::Value) -> Result<usize> {
        self.prices.write().await.extend_from_slice(bars);
        Ok(bars.len())
    }

    async fn save_news(&self, articles: &[NewsArticle]) -> Result<usize> {
        self.news.write().await.extend_from_slice(articles);
        Ok(articles.len())
    }

    async fn save_earnings(&self, reports: &[EarningsReport]) -> Result<usize> {
        self.earnings.write().await.extend_from_slice(reports);
        Ok(reports.len())
    }

    async fn load_prices(&self) -> Result<Vec<PriceBar>> {
        let mut bars = self.prices.read().await.clone();
        // Stable: load order survives for equal (symbol, timestamp)
        bars.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.timestamp.cmp(&b.timestamp)));
        Ok(bars)
    }

    async fn load_news(&self) -> Result<Vec<NewsArticle>> {
        Ok(self.news.read().await.clone())
    }

    async fn load_earnings(&self) -> Result<Vec<EarningsReport>> {
        Ok(self.earnings.read().await.clone())
    }
}

/// Newest first; rows appended later win ties.
fn newest_first<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K, limit: usize) -> Vec<T> {
    items.reverse();
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items.truncate(limit);
    items
}

fn matches(filter: Option<&str>, symbol: &str) -> bool {
    filter.is_none_or(|s| s == symbol)
}

/// Report read models over the in-memory logs and raw tables
#[derive(Clone, Default)]
pub struct InMemoryReportRepository {
    metrics: InMemoryMetricsRepository,
    predictions: InMemoryPredictionRepository,
    raw: InMemoryRawMarketDataRepository,
}

impl InMemoryReportRepository {
    /// Reads through the given repositories, seeing everything later
    /// appended to them.
    pub fn new(
        metrics: InMemoryMetricsRepository,
        predictions: InMemoryPredictionRepository,
        raw: InMemoryRawMarketDataRepository,
    ) -> Self {
        Self {
            metrics,
            predictions,
            raw,
        }
    }
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn latest_with_qc(&self) -> Result<Vec<PredictionWithQc>> {
        let predictions = self.predictions.records.read().await;
        let mut latest: BTreeMap<&str, &PredictionRecord> = BTreeMap::new();
        for p in predictions.iter() {
            match latest.get(p.symbol.as_str()) {
                Some(current) if current.date > p.date => {}
                _ => {
                    latest.insert(p.symbol.as_str(), p);
                }
            }
        }

        let metrics = self.metrics.records.read().await;
        let mut qc: BTreeMap<&str, &(NaiveDateTime, EvaluationRecord)> = BTreeMap::new();
        for m in metrics.iter() {
            match qc.get(m.1.symbol.as_str()) {
                Some(current) if current.0 > m.0 => {}
                _ => {
                    qc.insert(m.1.symbol.as_str(), m);
                }
            }
        }

        Ok(latest
            .into_iter()
            .map(|(symbol, p)| {
                let evaluation = qc.get(symbol).map(|(_, e)| e);
                PredictionWithQc {
                    date: p.date,
                    symbol: p.symbol.clone(),
                    probability_up: p.probability_up,
                    predicted_label: p.predicted_label,
                    auc: evaluation.and_then(|e| e.auc),
                    accuracy: evaluation.and_then(|e| e.accuracy),
                    row_count: evaluation.map(|e| e.row_count as i64),
                    model_version: p.model_version.clone(),
                }
            })
            .collect())
    }

    async fn prediction_history(
        &self,
        symbol: &str,
        since: NaiveDate,
    ) -> Result<Vec<PredictionRecord>> {
        let mut history: Vec<PredictionRecord> = self
            .predictions
            .records()
            .await
            .into_iter()
            .filter(|p| p.symbol == symbol && p.date >= since)
            .collect();
        history.sort_by_key(|p| p.date);
        Ok(history)
    }

    async fn metrics_history(
        &self,
        symbol: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ModelMetricsRow>> {
        let rows: Vec<ModelMetricsRow> = self
            .metrics
            .records
            .read()
            .await
            .iter()
            .filter(|(_, e)| matches(symbol, &e.symbol))
            .map(|(trained_at, e)| ModelMetricsRow {
                trained_at: *trained_at,
                symbol: e.symbol.clone(),
                auc: e.auc,
                accuracy: e.accuracy,
                row_count: e.row_count as i64,
                model_version: e.model_version.clone(),
            })
            .collect();
        Ok(newest_first(rows, |m| m.trained_at, limit))
    }

    async fn recent_news(
        &self,
        symbol: Option<&str>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<NewsArticle>> {
        let news: Vec<NewsArticle> = self
            .raw
            .news
            .read()
            .await
            .iter()
            .filter(|n| n.published_at >= since && matches(symbol, &n.symbol))
            .cloned()
            .collect();
        Ok(newest_first(news, |n| n.published_at, limit))
    }

    async fn recent_earnings(
        &self,
        symbol: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EarningsReport>> {
        let earnings: Vec<EarningsReport> = self
            .raw
            .earnings
            .read()
            .await
            .iter()
            .filter(|e| matches(symbol, &e.symbol))
            .cloned()
            .collect();
        Ok(newest_first(earnings, |e| e.report_date, limit))
    }
}
