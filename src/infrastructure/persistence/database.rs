use crate::config::WarehouseEnvConfig;
use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Warehouse connection pool with the MarketPulse schema applied.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn connect(config: &WarehouseEnvConfig) -> Result<Self> {
        Self::new(&config.database_url, config.max_connections).await
    }

    pub async fn new(db_url: &str, max_connections: u32) -> Result<Self> {
        let in_memory = db_url.contains(":memory:");

        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://")
            && !in_memory
        {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let mut options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("Invalid DATABASE_URL: {}", db_url))?
            .create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to `sqlite::memory:` opens its own empty database
        let max_connections = if in_memory { 1 } else { max_connections.max(1) };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        // 1. Raw ingestion tables (append-only, payload kept verbatim)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS raw_prices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                ts INTEGER NOT NULL,
                open TEXT NOT NULL,
                high TEXT NOT NULL,
                low TEXT NOT NULL,
                close TEXT NOT NULL,
                volume INTEGER NOT NULL,
                raw_payload TEXT,
                loaded_at TEXT DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );
            CREATE INDEX IF NOT EXISTS idx_raw_prices_symbol_ts
            ON raw_prices (symbol, ts);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create raw_prices table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS raw_news (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                published_at TEXT NOT NULL,
                headline TEXT NOT NULL,
                sentiment REAL,
                raw_payload TEXT,
                loaded_at TEXT DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create raw_news table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS raw_earnings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                report_date TEXT NOT NULL,
                actual_eps REAL,
                consensus_eps REAL,
                surprise_pct REAL,
                raw_payload TEXT,
                loaded_at TEXT DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create raw_earnings table")?;

        // 2. Feature table, rebuilt in full by the feature builder
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS features_daily (
                date TEXT NOT NULL,
                symbol TEXT NOT NULL,
                ret_d1 REAL,
                ret_5d REAL,
                vol_20d REAL,
                articles_1d REAL,
                articles_3d REAL,
                surprise_pct REAL,
                label_up_next_day INTEGER,
                PRIMARY KEY (symbol, date)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create features_daily table")?;

        // 3. Model outputs (append-only)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ml_model_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                trained_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                symbol TEXT NOT NULL,
                auc REAL,
                accuracy REAL,
                n_rows INTEGER NOT NULL,
                model_version TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_metrics_symbol_trained
            ON ml_model_metrics (symbol, trained_at);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create ml_model_metrics table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ml_predictions_daily (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                symbol TEXT NOT NULL,
                p_up REAL NOT NULL,
                pred_label INTEGER NOT NULL,
                model_version TEXT NOT NULL,
                inserted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );
            CREATE INDEX IF NOT EXISTS idx_predictions_symbol_date
            ON ml_predictions_daily (symbol, date);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create ml_predictions_daily table")?;

        // 4. Read models. `id` breaks ties between rows written in the same millisecond.
        sqlx::query(
            r#"
            CREATE VIEW IF NOT EXISTS latest_predictions AS
            SELECT date, symbol, p_up, pred_label, model_version, inserted_at
            FROM (
                SELECT p.*,
                       ROW_NUMBER() OVER (
                           PARTITION BY symbol
                           ORDER BY date DESC, inserted_at DESC, id DESC
                       ) AS rn
                FROM ml_predictions_daily p
            )
            WHERE rn = 1;

            CREATE VIEW IF NOT EXISTS latest_model_metrics AS
            SELECT symbol, auc, accuracy, n_rows, model_version, trained_at
            FROM (
                SELECT m.*,
                       ROW_NUMBER() OVER (
                           PARTITION BY symbol
                           ORDER BY trained_at DESC, id DESC
                       ) AS rn
                FROM ml_model_metrics m
            )
            WHERE rn = 1;

            CREATE VIEW IF NOT EXISTS vw_predictions_with_qc AS
            SELECT p.date, p.symbol, p.p_up, p.pred_label,
                   m.auc, m.accuracy, m.n_rows, p.model_version
            FROM latest_predictions p
            LEFT JOIN latest_model_metrics m ON m.symbol = p.symbol;
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create reporting views")?;

        info!("Database schema initialized.");
        Ok(())
    }
}
