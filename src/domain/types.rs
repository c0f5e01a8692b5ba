use crate::domain::ml::feature_registry::FEATURE_COUNT;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw feature values in registry order. `None` is a missing value.
pub type RawFeatures = [Option<f64>; FEATURE_COUNT];

/// Dense feature vector handed to a classifier (missing values already zeroed).
pub type FeatureVector = [f64; FEATURE_COUNT];

/// One observation for one symbol on one trading date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub features: RawFeatures,
    /// `Some(true)` when the next trading day's close is higher.
    /// `None` for the most recent dates whose outcome is not known yet.
    pub label: Option<bool>,
}

impl FeatureRow {
    pub fn new(date: NaiveDate, symbol: &str, features: RawFeatures, label: Option<bool>) -> Self {
        Self {
            date,
            symbol: symbol.to_string(),
            features,
            label,
        }
    }

    /// Feature vector with missing values replaced by 0.0.
    pub fn dense_features(&self) -> FeatureVector {
        crate::domain::ml::feature_registry::fill_missing(&self.features)
    }
}

/// Quality metrics of one symbol's model for one training run.
///
/// `auc` and `accuracy` are `None` when no held-out evaluation was possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub symbol: String,
    pub auc: Option<f64>,
    pub accuracy: Option<f64>,
    pub row_count: usize,
    pub model_version: String,
}

/// Next-day direction prediction for one symbol on the latest feature date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub probability_up: f64,
    pub predicted_label: u8,
    pub model_version: String,
}

/// Daily OHLCV bar as delivered by the price source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    /// Bar open time, unix seconds.
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub symbol: String,
    pub published_at: DateTime<Utc>,
    pub headline: String,
    pub sentiment: Option<f64>,
    pub raw_payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsReport {
    pub symbol: String,
    pub report_date: NaiveDate,
    pub actual_eps: Option<f64>,
    pub consensus_eps: Option<f64>,
    pub surprise_pct: Option<f64>,
    pub raw_payload: serde_json::Value,
}

/// Latest prediction of a symbol joined with its latest model metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionWithQc {
    pub date: NaiveDate,
    pub symbol: String,
    pub probability_up: f64,
    pub predicted_label: u8,
    pub auc: Option<f64>,
    pub accuracy: Option<f64>,
    pub row_count: Option<i64>,
    pub model_version: String,
}

/// One row of the append-only metrics log, as read back for QC trends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetricsRow {
    /// UTC time the row was written.
    pub trained_at: NaiveDateTime,
    pub symbol: String,
    pub auc: Option<f64>,
    pub accuracy: Option<f64>,
    pub row_count: i64,
    pub model_version: String,
}

/// Direction implied by a predicted label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl From<u8> for Direction {
    fn from(label: u8) -> Self {
        if label == 1 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}
