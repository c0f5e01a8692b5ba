use super::raw_market_data_repository::{earnings_from_row, news_from_row};
use crate::domain::repositories::ReportRepository;
use crate::domain::types::{
    EarningsReport, ModelMetricsRow, NewsArticle, PredictionRecord, PredictionWithQc,
};
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Reads the reporting views
pub struct SqliteReportRepository {
    database: Database,
}

impl SqliteReportRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl ReportRepository for SqliteReportRepository {
    async fn latest_with_qc(&self) -> Result<Vec<PredictionWithQc>> {
        let rows = sqlx::query(
            r#"
            SELECT date, symbol, p_up, pred_label, auc, accuracy, n_rows, model_version
            FROM vw_predictions_with_qc
            ORDER BY symbol
            "#,
        )
        .fetch_all(&self.database.pool)
        .await
        .context("Failed to query vw_predictions_with_qc")?;

        rows.iter()
            .map(|row| {
                let label: i64 = row.try_get("pred_label")?;
                Ok(PredictionWithQc {
                    date: row.try_get("date")?,
                    symbol: row.try_get("symbol")?,
                    probability_up: row.try_get("p_up")?,
                    predicted_label: u8::from(label == 1),
                    auc: row.try_get("auc")?,
                    accuracy: row.try_get("accuracy")?,
                    row_count: row.try_get("n_rows")?,
                    model_version: row.try_get("model_version")?,
                })
            })
            .collect()
    }

    async fn prediction_history(
        &self,
        symbol: &str,
        since: NaiveDate,
    ) -> Result<Vec<PredictionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT date, symbol, p_up, pred_label, model_version
            FROM ml_predictions_daily
            WHERE symbol = ? AND date >= ?
            ORDER BY date, inserted_at, id
            "#,
        )
        .bind(symbol)
        .bind(since)
        .fetch_all(&self.database.pool)
        .await
        .with_context(|| format!("Failed to query prediction history for {}", symbol))?;

        rows.iter()
            .map(|row| {
                let label: i64 = row.try_get("pred_label")?;
                Ok(PredictionRecord {
                    date: row.try_get("date")?,
                    symbol: row.try_get("symbol")?,
                    probability_up: row.try_get("p_up")?,
                    predicted_label: u8::from(label == 1),
                    model_version: row.try_get("model_version")?,
                })
            })
            .collect()
    }

    async fn metrics_history(
        &self,
        symbol: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ModelMetricsRow>> {
        let rows = sqlx::query(
            r#"
            SELECT trained_at, symbol, auc, accuracy, n_rows, model_version
            FROM ml_model_metrics
            WHERE (? IS NULL OR symbol = ?)
            ORDER BY trained_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(symbol)
        .bind(symbol)
        .bind(sql_limit(limit))
        .fetch_all(&self.database.pool)
        .await
        .context("Failed to query ml_model_metrics")?;

        rows.iter()
            .map(|row| {
                Ok(ModelMetricsRow {
                    trained_at: row.try_get("trained_at")?,
                    symbol: row.try_get("symbol")?,
                    auc: row.try_get("auc")?,
                    accuracy: row.try_get("accuracy")?,
                    row_count: row.try_get("n_rows")?,
                    model_version: row.try_get("model_version")?,
                })
            })
            .collect()
    }

    async fn recent_news(
        &self,
        symbol: Option<&str>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<NewsArticle>> {
        let rows = sqlx::query(
            r#"
            SELECT symbol, published_at, headline, sentiment, raw_payload
            FROM raw_news
            WHERE published_at >= ? AND (? IS NULL OR symbol = ?)
            ORDER BY published_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(since)
        .bind(symbol)
        .bind(symbol)
        .bind(sql_limit(limit))
        .fetch_all(&self.database.pool)
        .await
        .context("Failed to query raw_news")?;

        rows.iter().map(news_from_row).collect()
    }

    async fn recent_earnings(
        &self,
        symbol: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EarningsReport>> {
        let rows = sqlx::query(
            r#"
            SELECT symbol, report_date, actual_eps, consensus_eps, surprise_pct, raw_payload
            FROM raw_earnings
            WHERE (? IS NULL OR symbol = ?)
            ORDER BY report_date DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(symbol)
        .bind(symbol)
        .bind(sql_limit(limit))
        .fetch_all(&self.database.pool)
        .await
        .context("Failed to query raw_earnings")?;

        rows.iter().map(earnings_from_row).collect()
    }
}
