//! Repository Pattern Abstractions
//!
//! This module defines the warehouse-facing traits used by the pipeline,
//! keeping the training and inference logic free of any SQL.
//!
//! # Design
//!
//! - `FeatureRepository`: the feature provider (read) and the materialised
//!   feature table (write, used by the feature builder)
//! - `MetricsRepository` / `PredictionRepository`: append-only sinks
//! - `RawMarketDataRepository`: raw ingestion tables
//! - `ReportRepository`: read models behind the report surface
//!
//! The SQLite implementations live in `infrastructure::persistence`, the
//! in-memory ones in `infrastructure::repositories`.
//!
//! # Example
//!
//! ```rust,no_run
//! use marketpulse::domain::repositories::FeatureRepository;
//! use marketpulse::infrastructure::InMemoryFeatureRepository;
//!
//! # async {
//! let repo = InMemoryFeatureRepository::new();
//! let rows = repo.load_features(730).await?;
//! # anyhow::Ok(())
//! # };
//! ```

use crate::domain::types::{
    EarningsReport, EvaluationRecord, FeatureRow, ModelMetricsRow, NewsArticle, PredictionRecord,
    PredictionWithQc, PriceBar,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Feature table access
#[async_trait]
pub trait FeatureRepository: Send + Sync {
    /// Load all rows within `lookback_days` of the latest available date,
    /// ordered by symbol then date.
    async fn load_features(&self, lookback_days: i64) -> Result<Vec<FeatureRow>>;

    /// Replace the whole feature table with `rows`. Returns rows written.
    async fn replace_all(&self, rows: &[FeatureRow]) -> Result<usize>;
}

/// Append-only log of per-symbol model metrics
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Append one row per record. Returns rows written.
    async fn append(&self, records: &[EvaluationRecord]) -> Result<usize>;
}

/// Append-only log of daily predictions
#[async_trait]
pub trait PredictionRepository: Send + Sync {
    /// Append one row per record. Returns rows written.
    async fn append(&self, records: &[PredictionRecord]) -> Result<usize>;
}

/// Raw ingestion tables (append-only)
#[async_trait]
pub trait RawMarketDataRepository: Send + Sync {
    async fn save_prices(
        &self,
        bars: &[PriceBar],
        raw_payload: &serde_json::Value,
    ) -> Result<usize>;

    async fn save_news(&self, articles: &[NewsArticle]) -> Result<usize>;

    async fn save_earnings(&self, reports: &[EarningsReport]) -> Result<usize>;

    /// All bars, ordered by symbol, timestamp and load order.
    async fn load_prices(&self) -> Result<Vec<PriceBar>>;

    async fn load_news(&self) -> Result<Vec<NewsArticle>>;

    async fn load_earnings(&self) -> Result<Vec<EarningsReport>>;
}

/// Read models for the report surface
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Latest prediction per symbol joined with its latest metrics row.
    async fn latest_with_qc(&self) -> Result<Vec<PredictionWithQc>>;

    /// Predictions for one symbol since `since`, oldest first.
    async fn prediction_history(
        &self,
        symbol: &str,
        since: NaiveDate,
    ) -> Result<Vec<PredictionRecord>>;

    /// Metrics log rows, newest first, for one symbol or all of them.
    async fn metrics_history(
        &self,
        symbol: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ModelMetricsRow>>;

    /// Articles published at or after `since`, newest first.
    async fn recent_news(
        &self,
        symbol: Option<&str>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<NewsArticle>>;

    /// Earnings reports, most recent report date first.
    async fn recent_earnings(
        &self,
        symbol: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EarningsReport>>;
}
