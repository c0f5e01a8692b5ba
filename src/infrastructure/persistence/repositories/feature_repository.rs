use crate::domain::repositories::FeatureRepository;
use crate::domain::types::FeatureRow;
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::debug;

pub struct SqliteFeatureRepository {
    database: Database,
}

impl SqliteFeatureRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn map_row(row: &SqliteRow) -> Result<FeatureRow> {
        let date: NaiveDate = row.try_get("date")?;
        let symbol: String = row.try_get("symbol")?;
        let label: Option<i64> = row.try_get("label_up_next_day")?;
        Ok(FeatureRow {
            date,
            symbol,
            features: [
                row.try_get("ret_d1")?,
                row.try_get("ret_5d")?,
                row.try_get("vol_20d")?,
                row.try_get("articles_1d")?,
                row.try_get("articles_3d")?,
                row.try_get("surprise_pct")?,
            ],
            label: label.map(|l| l != 0),
        })
    }
}

#[async_trait]
impl FeatureRepository for SqliteFeatureRepository {
    async fn load_features(&self, lookback_days: i64) -> Result<Vec<FeatureRow>> {
        // Window ends at the latest stored date, not at today
        let rows = sqlx::query(
            r#"
            SELECT date, symbol, ret_d1, ret_5d, vol_20d,
                   articles_1d, articles_3d, surprise_pct, label_up_next_day
            FROM features_daily
            WHERE date >= date((SELECT MAX(date) FROM features_daily), ?)
            ORDER BY symbol, date
            "#,
        )
        .bind(format!("-{} days", lookback_days))
        .fetch_all(&self.database.pool)
        .await
        .context("Failed to load features")?;

        let features = rows.iter().map(Self::map_row).collect::<Result<Vec<_>>>()?;
        debug!(
            "Loaded {} feature rows ({} day lookback)",
            features.len(),
            lookback_days
        );
        Ok(features)
    }

    async fn replace_all(&self, rows: &[FeatureRow]) -> Result<usize> {
        let mut tx = self.database.pool.begin().await?;

        sqlx::query("DELETE FROM features_daily")
            .execute(&mut *tx)
            .await
            .context("Failed to clear features_daily")?;

        for row in rows {
            let [ret_d1, ret_5d, vol_20d, articles_1d, articles_3d, surprise_pct] = row.features;
            sqlx::query(
                r#"
                INSERT INTO features_daily (
                    date, symbol, ret_d1, ret_5d, vol_20d,
                    articles_1d, articles_3d, surprise_pct, label_up_next_day
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(row.date)
            .bind(&row.symbol)
            .bind(ret_d1)
            .bind(ret_5d)
            .bind(vol_20d)
            .bind(articles_1d)
            .bind(articles_3d)
            .bind(surprise_pct)
            .bind(row.label.map(i64::from))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert features for {} {}", row.symbol, row.date))?;
        }

        tx.commit().await.context("Failed to commit feature table")?;
        Ok(rows.len())
    }
}
