//! Run summary reporting for MarketPulse
//!
//! Every batch run ends with one machine-readable line on stdout, prefixed
//! so that log shippers can pick it out of the human-readable output.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const RUN_SUMMARY_PREFIX: &str = "RUN_SUMMARY_JSON:";

/// Outcome of one train-and-infer run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub version: String,
    pub model_version: String,
    pub classifier: String,
    pub feature_rows: usize,
    pub trained_symbols: usize,
    pub skipped_symbols: usize,
    pub skipped_by_reason: BTreeMap<String, usize>,
    pub metrics_rows_written: usize,
    pub prediction_date: Option<NaiveDate>,
    pub prediction_rows_written: usize,
    pub prediction_failures: usize,
}

impl RunSummary {
    pub fn new(model_version: &str, classifier: &str) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model_version: model_version.to_string(),
            classifier: classifier.to_string(),
            feature_rows: 0,
            trained_symbols: 0,
            skipped_symbols: 0,
            skipped_by_reason: BTreeMap::new(),
            metrics_rows_written: 0,
            prediction_date: None,
            prediction_rows_written: 0,
            prediction_failures: 0,
        }
    }
}

/// Prefixed JSON line for `summary`.
pub fn summary_line<T: Serialize>(summary: &T) -> serde_json::Result<String> {
    Ok(format!("{}{}", RUN_SUMMARY_PREFIX, serde_json::to_string(summary)?))
}

/// Logs the summary and prints its JSON line to stdout.
pub fn emit_run_summary(summary: &RunSummary) {
    info!(
        "Run complete: trained {} | skipped {} {:?} | metrics rows {} | prediction rows {}",
        summary.trained_symbols,
        summary.skipped_symbols,
        summary.skipped_by_reason,
        summary.metrics_rows_written,
        summary.prediction_rows_written
    );
    match summary_line(summary) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!("Failed to serialize run summary: {}", e),
    }
}
