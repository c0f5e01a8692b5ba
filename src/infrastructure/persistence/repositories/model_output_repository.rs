use crate::domain::repositories::{MetricsRepository, PredictionRepository};
use crate::domain::types::{EvaluationRecord, PredictionRecord};
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

/// Append-only writer for `ml_model_metrics`
pub struct SqliteMetricsRepository {
    database: Database,
}

impl SqliteMetricsRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl MetricsRepository for SqliteMetricsRepository {
    async fn append(&self, records: &[EvaluationRecord]) -> Result<usize> {
        let mut tx = self.database.pool.begin().await?;
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO ml_model_metrics (symbol, auc, accuracy, n_rows, model_version)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.symbol)
            .bind(record.auc)
            .bind(record.accuracy)
            .bind(record.row_count as i64)
            .bind(&record.model_version)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to write metrics for {}", record.symbol))?;
        }
        tx.commit().await.context("Failed to commit model metrics")?;

        info!("Wrote {} metrics rows", records.len());
        Ok(records.len())
    }
}

/// Append-only writer for `ml_predictions_daily`
pub struct SqlitePredictionRepository {
    database: Database,
}

impl SqlitePredictionRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl PredictionRepository for SqlitePredictionRepository {
    async fn append(&self, records: &[PredictionRecord]) -> Result<usize> {
        let mut tx = self.database.pool.begin().await?;
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO ml_predictions_daily (date, symbol, p_up, pred_label, model_version)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(record.date)
            .bind(&record.symbol)
            .bind(record.probability_up)
            .bind(i64::from(record.predicted_label))
            .bind(&record.model_version)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to write prediction for {}", record.symbol))?;
        }
        tx.commit().await.context("Failed to commit predictions")?;

        info!("Wrote {} prediction rows", records.len());
        Ok(records.len())
    }
}
