use crate::domain::repositories::RawMarketDataRepository;
use crate::domain::types::{EarningsReport, NewsArticle, PriceBar};
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use std::str::FromStr;

pub struct SqliteRawMarketDataRepository {
    database: Database,
}

impl SqliteRawMarketDataRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

fn payload_text(payload: &serde_json::Value) -> Result<String> {
    serde_json::to_string(payload).context("Failed to serialize raw payload")
}

fn parse_payload(text: Option<String>) -> Result<serde_json::Value> {
    match text {
        Some(t) => serde_json::from_str(&t).context("Corrupt raw payload"),
        None => Ok(serde_json::Value::Null),
    }
}

pub(super) fn news_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<NewsArticle> {
    let published_at: DateTime<Utc> = row.try_get("published_at")?;
    Ok(NewsArticle {
        symbol: row.try_get("symbol")?,
        published_at,
        headline: row.try_get("headline")?,
        sentiment: row.try_get("sentiment")?,
        raw_payload: parse_payload(row.try_get("raw_payload")?)?,
    })
}

pub(super) fn earnings_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<EarningsReport> {
    let report_date: NaiveDate = row.try_get("report_date")?;
    Ok(EarningsReport {
        symbol: row.try_get("symbol")?,
        report_date,
        actual_eps: row.try_get("actual_eps")?,
        consensus_eps: row.try_get("consensus_eps")?,
        surprise_pct: row.try_get("surprise_pct")?,
        raw_payload: parse_payload(row.try_get("raw_payload")?)?,
    })
}

fn parse_decimal(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<Decimal> {
    let text: String = row.try_get(column)?;
    Decimal::from_str(&text).with_context(|| format!("Invalid decimal in {}: {}", column, text))
}

#[async_trait]
impl RawMarketDataRepository for SqliteRawMarketDataRepository {
    async fn save_prices(&self, bars: &[PriceBar], raw_payload: &serde_json::Value) -> Result<usize> {
        let payload = payload_text(raw_payload)?;
        let mut tx = self.database.pool.begin().await?;
        for bar in bars {
            sqlx::query(
                r#"
                INSERT INTO raw_prices (symbol, ts, open, high, low, close, volume, raw_payload)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&bar.symbol)
            .bind(bar.timestamp)
            .bind(bar.open.to_string())
            .bind(bar.high.to_string())
            .bind(bar.low.to_string())
            .bind(bar.close.to_string())
            .bind(bar.volume as i64)
            .bind(&payload)
            .execute(&mut *tx)
            .await
            .context("Failed to insert raw price")?;
        }
        tx.commit().await.context("Failed to commit raw prices")?;
        Ok(bars.len())
    }

    async fn save_news(&self, articles: &[NewsArticle]) -> Result<usize> {
        let mut tx = self.database.pool.begin().await?;
        for article in articles {
            sqlx::query(
                r#"
                INSERT INTO raw_news (symbol, published_at, headline, sentiment, raw_payload)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&article.symbol)
            .bind(article.published_at)
            .bind(&article.headline)
            .bind(article.sentiment)
            .bind(payload_text(&article.raw_payload)?)
            .execute(&mut *tx)
            .await
            .context("Failed to insert raw news")?;
        }
        tx.commit().await.context("Failed to commit raw news")?;
        Ok(articles.len())
    }

    async fn save_earnings(&self, reports: &[EarningsReport]) -> Result<usize> {
        let mut tx = self.database.pool.begin().await?;
        for report in reports {
            sqlx::query(
                r#"
                INSERT INTO raw_earnings (
                    symbol, report_date, actual_eps, consensus_eps, surprise_pct, raw_payload
                )
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&report.symbol)
            .bind(report.report_date)
            .bind(report.actual_eps)
            .bind(report.consensus_eps)
            .bind(report.surprise_pct)
            .bind(payload_text(&report.raw_payload)?)
            .execute(&mut *tx)
            .await
            .context("Failed to insert raw earnings")?;
        }
        tx.commit().await.context("Failed to commit raw earnings")?;
        Ok(reports.len())
    }

    async fn load_prices(&self) -> Result<Vec<PriceBar>> {
        let rows = sqlx::query(
            "SELECT symbol, ts, open, high, low, close, volume FROM raw_prices ORDER BY symbol, ts, id",
        )
        .fetch_all(&self.database.pool)
        .await
        .context("Failed to load raw prices")?;

        rows.iter()
            .map(|row| {
                let volume: i64 = row.try_get("volume")?;
                Ok(PriceBar {
                    symbol: row.try_get("symbol")?,
                    timestamp: row.try_get("ts")?,
                    open: parse_decimal(row, "open")?,
                    high: parse_decimal(row, "high")?,
                    low: parse_decimal(row, "low")?,
                    close: parse_decimal(row, "close")?,
                    volume: volume.max(0) as u64,
                })
            })
            .collect()
    }

    async fn load_news(&self) -> Result<Vec<NewsArticle>> {
        let rows = sqlx::query(
            "SELECT symbol, published_at, headline, sentiment, raw_payload FROM raw_news ORDER BY symbol, published_at, id",
        )
        .fetch_all(&self.database.pool)
        .await
        .context("Failed to load raw news")?;

        rows.iter().map(news_from_row).collect()
    }

    async fn load_earnings(&self) -> Result<Vec<EarningsReport>> {
        let rows = sqlx::query(
            r#"
            SELECT symbol, report_date, actual_eps, consensus_eps, surprise_pct, raw_payload
            FROM raw_earnings
            ORDER BY symbol, report_date, id
            "#,
        )
        .fetch_all(&self.database.pool)
        .await
        .context("Failed to load raw earnings")?;

        rows.iter().map(earnings_from_row).collect()
    }
}
