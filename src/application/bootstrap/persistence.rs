use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::WarehouseEnvConfig;
use crate::domain::repositories::{
    FeatureRepository, MetricsRepository, PredictionRepository, RawMarketDataRepository,
    ReportRepository,
};
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::repositories::{
    SqliteFeatureRepository, SqliteMetricsRepository, SqlitePredictionRepository,
    SqliteRawMarketDataRepository, SqliteReportRepository,
};

pub struct PersistenceHandle {
    pub db: Database,
    pub raw_repository: Arc<dyn RawMarketDataRepository>,
    pub feature_repository: Arc<dyn FeatureRepository>,
    pub metrics_repository: Arc<dyn MetricsRepository>,
    pub prediction_repository: Arc<dyn PredictionRepository>,
    pub report_repository: Arc<dyn ReportRepository>,
}

impl PersistenceHandle {
    pub fn from_database(db: Database) -> Self {
        Self {
            raw_repository: Arc::new(SqliteRawMarketDataRepository::new(db.clone())),
            feature_repository: Arc::new(SqliteFeatureRepository::new(db.clone())),
            metrics_repository: Arc::new(SqliteMetricsRepository::new(db.clone())),
            prediction_repository: Arc::new(SqlitePredictionRepository::new(db.clone())),
            report_repository: Arc::new(SqliteReportRepository::new(db.clone())),
            db,
        }
    }
}

pub struct PersistenceBootstrap;

impl PersistenceBootstrap {
    pub async fn init(config: &WarehouseEnvConfig) -> Result<PersistenceHandle> {
        info!("Initializing warehouse at {}", config.database_url);

        let db = Database::connect(config)
            .await
            .context("Failed to initialize database")?;

        Ok(PersistenceHandle::from_database(db))
    }
}
