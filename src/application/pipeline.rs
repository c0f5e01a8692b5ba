//! Batch jobs: the train-and-infer run and the retrying stage runner used by
//! the daily pipeline.

use crate::application::ml::inference::predict_latest;
use crate::application::ml::trainer::PerSymbolTrainer;
use crate::domain::repositories::{FeatureRepository, MetricsRepository, PredictionRepository};
use crate::infrastructure::observability::RunSummary;
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Loads features, trains one model per symbol, then appends metrics and
/// predictions. Metrics are always written before predictions.
pub struct TrainAndInferJob {
    features: Arc<dyn FeatureRepository>,
    metrics: Arc<dyn MetricsRepository>,
    predictions: Arc<dyn PredictionRepository>,
    trainer: Arc<PerSymbolTrainer>,
    classifier_name: String,
    lookback_days: i64,
}

impl TrainAndInferJob {
    pub fn new(
        features: Arc<dyn FeatureRepository>,
        metrics: Arc<dyn MetricsRepository>,
        predictions: Arc<dyn PredictionRepository>,
        trainer: PerSymbolTrainer,
        lookback_days: i64,
    ) -> Self {
        let classifier_name = trainer.classifier_name().to_string();
        Self {
            features,
            metrics,
            predictions,
            trainer: Arc::new(trainer),
            classifier_name,
            lookback_days,
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let model_version = self.trainer.config().model_version.clone();
        let mut summary = RunSummary::new(&model_version, &self.classifier_name);

        let rows = self
            .features
            .load_features(self.lookback_days)
            .await
            .context("Failed to load feature rows")?;
        summary.feature_rows = rows.len();
        info!(
            "Loaded {} feature rows ({} day lookback)",
            rows.len(),
            self.lookback_days
        );

        // CPU bound, possibly on rayon: keep it off the async workers
        let trainer = Arc::clone(&self.trainer);
        let rows = Arc::new(rows);
        let training_rows = Arc::clone(&rows);
        let outcome =
            tokio::task::spawn_blocking(move || trainer.train_per_symbol(&training_rows))
                .await
                .context("Training task panicked")?;
        summary.trained_symbols = outcome.trained_count();
        summary.skipped_symbols = outcome.skipped_count();
        summary.skipped_by_reason = outcome
            .skipped_by_reason()
            .into_iter()
            .map(|(kind, count)| (kind.to_string(), count))
            .collect();

        summary.metrics_rows_written = self
            .metrics
            .append(&outcome.evaluation_records())
            .await
            .context("Failed to write model metrics")?;

        let inference = predict_latest(&rows, &outcome.models, &model_version);
        summary.prediction_date = inference.date;
        summary.prediction_failures = inference.failed.len();

        summary.prediction_rows_written = self
            .predictions
            .append(&inference.predictions)
            .await
            .context("Failed to write predictions")?;

        Ok(summary)
    }
}

/// Runs `stage` once, then up to `retries` more times after `delay`.
pub async fn run_stage_with_retry<T, F, Fut>(
    name: &str,
    retries: u32,
    delay: Duration,
    mut stage: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        info!("Stage '{}' starting (attempt {}/{})", name, attempt, retries + 1);
        match stage().await {
            Ok(value) => {
                info!("Stage '{}' completed", name);
                return Ok(value);
            }
            Err(e) if attempt <= retries => {
                warn!(
                    "Stage '{}' failed: {:#}. Retrying in {:?}",
                    name, e, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                error!("Stage '{}' failed after {} attempts: {:#}", name, attempt, e);
                return Err(e.context(format!("Stage '{}' failed", name)));
            }
        }
    }
}
