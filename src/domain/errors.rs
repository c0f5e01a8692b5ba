use chrono::NaiveDate;
use thiserror::Error;

/// Failures of the fitting / scoring primitives for a single symbol.
///
/// Data-quality conditions (too few rows, one label class, no valid split)
/// are not errors; they are handled as fallback branches by the trainer.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Malformed feature row {row}: {reason}")]
    MalformedFeatures { row: usize, reason: String },

    #[error("Duplicate feature date {date} for {symbol}")]
    DuplicateDate { symbol: String, date: NaiveDate },

    #[error("Model fit failed: {reason}")]
    FitFailed { reason: String },

    #[error("Prediction failed: {reason}")]
    PredictFailed { reason: String },
}

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Missing required setting: {key}")]
    Missing { key: String },
}
