//! The three daily stages, each usable on its own or chained by the
//! `daily_pipeline` binary.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use super::persistence::PersistenceHandle;
use super::services::ServicesHandle;
use crate::application::feature_engineering_service::FeatureEngineeringService;
use crate::application::ingestion::{IngestionReport, IngestionService};
use crate::application::ml::trainer::PerSymbolTrainer;
use crate::application::pipeline::TrainAndInferJob;
use crate::config::Config;
use crate::infrastructure::observability::RunSummary;

pub async fn ingest(
    config: &Config,
    services: &ServicesHandle,
    persistence: &PersistenceHandle,
) -> Result<IngestionReport> {
    let service = IngestionService::new(
        services.market_data.clone(),
        services.news.clone(),
        services.earnings.clone(),
        persistence.raw_repository.clone(),
    );
    service
        .run(&config.ingestion.settings(), Utc::now().date_naive())
        .await
}

pub async fn build_features(persistence: &PersistenceHandle) -> Result<usize> {
    let service = FeatureEngineeringService::new(
        persistence.raw_repository.clone(),
        persistence.feature_repository.clone(),
    );
    let rows = service.rebuild().await.context("Feature build failed")?;
    info!("features_daily rebuilt with {} rows", rows);
    Ok(rows)
}

pub async fn train_and_infer(
    config: &Config,
    persistence: &PersistenceHandle,
) -> Result<RunSummary> {
    let trainer = PerSymbolTrainer::new(
        config.training.classifier.build(),
        config.training.trainer_config(),
    );
    let job = TrainAndInferJob::new(
        persistence.feature_repository.clone(),
        persistence.metrics_repository.clone(),
        persistence.prediction_repository.clone(),
        trainer,
        config.training.lookback_days,
    );
    job.run().await
}
