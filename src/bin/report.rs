use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;
use marketpulse::application::bootstrap::PersistenceBootstrap;
use marketpulse::application::reporting::{
    EarningsReportRow, HistoryReportRow, LatestReportRow, MetricsReportRow, NewsReportRow,
    filter_by_min_auc, render_earnings_table, render_history_table, render_latest_table,
    render_metrics_table, render_news_table, write_csv,
};
use marketpulse::config::Config;
use marketpulse::domain::repositories::ReportRepository;
use marketpulse::infrastructure::observability::init_tracing;
use std::io;

const DEFAULT_METRICS_LIMIT: usize = 300;
const DEFAULT_NEWS_LIMIT: usize = 200;
/// Eight quarters for a few dozen symbols.
const DEFAULT_EARNINGS_LIMIT: usize = 160;

#[derive(Parser, Debug)]
#[command(author, version, about = "Show the latest predictions with model QC")]
struct Args {
    /// Restrict to one symbol. Without a listing flag, shows its prediction history
    #[arg(long)]
    symbol: Option<String>,

    /// History window in days (with --symbol)
    #[arg(long, default_value_t = 30)]
    history_days: i64,

    /// Only show latest predictions whose model AUC is at least this value.
    /// Symbols without an AUC are left out.
    #[arg(long, conflicts_with_all = ["metrics", "news", "earnings"])]
    min_auc: Option<f64>,

    /// List training metrics, newest first
    #[arg(long, conflicts_with_all = ["news", "earnings"])]
    metrics: bool,

    /// List recent news headlines, newest first
    #[arg(long, conflicts_with = "earnings")]
    news: bool,

    /// News window in days (with --news)
    #[arg(long, default_value_t = 60)]
    news_days: i64,

    /// List earnings reports, most recent first
    #[arg(long)]
    earnings: bool,

    /// Maximum rows for --metrics, --news or --earnings
    #[arg(long)]
    limit: Option<usize>,

    /// Write CSV to stdout instead of an aligned table
    #[arg(long)]
    csv: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.observability);

    let persistence = PersistenceBootstrap::init(&config.warehouse).await?;
    let reports = persistence.report_repository;
    let symbol = args.symbol.as_deref().map(|s| s.trim().to_uppercase());

    if args.metrics {
        let limit = args.limit.unwrap_or(DEFAULT_METRICS_LIMIT);
        let metrics = reports.metrics_history(symbol.as_deref(), limit).await?;
        let rows: Vec<MetricsReportRow> = metrics.iter().map(MetricsReportRow::from).collect();

        if args.csv {
            write_csv(&rows, io::stdout())?;
        } else if rows.is_empty() {
            println!("No training metrics yet. Run the daily pipeline first.");
        } else {
            print!("{}", render_metrics_table(&rows));
        }
        return Ok(());
    }

    if args.news {
        let limit = args.limit.unwrap_or(DEFAULT_NEWS_LIMIT);
        let since = Utc::now() - Duration::days(args.news_days);
        let news = reports.recent_news(symbol.as_deref(), since, limit).await?;
        let rows: Vec<NewsReportRow> = news.iter().map(NewsReportRow::from).collect();

        if args.csv {
            write_csv(&rows, io::stdout())?;
        } else if rows.is_empty() {
            println!("No news in the last {} days", args.news_days);
        } else {
            print!("{}", render_news_table(&rows));
        }
        return Ok(());
    }

    if args.earnings {
        let limit = args.limit.unwrap_or(DEFAULT_EARNINGS_LIMIT);
        let earnings = reports.recent_earnings(symbol.as_deref(), limit).await?;
        let rows: Vec<EarningsReportRow> = earnings.iter().map(EarningsReportRow::from).collect();

        if args.csv {
            write_csv(&rows, io::stdout())?;
        } else if rows.is_empty() {
            println!("No earnings reports stored");
        } else {
            print!("{}", render_earnings_table(&rows));
        }
        return Ok(());
    }

    match symbol {
        Some(symbol) => {
            let since = Utc::now().date_naive() - Duration::days(args.history_days);
            let history = reports.prediction_history(&symbol, since).await?;
            let rows: Vec<HistoryReportRow> = history.iter().map(HistoryReportRow::from).collect();

            if args.csv {
                write_csv(&rows, io::stdout())?;
            } else if rows.is_empty() {
                println!("No predictions for {} in the last {} days", symbol, args.history_days);
            } else {
                print!("{}", render_history_table(&rows));
            }
        }
        None => {
            let mut latest = reports.latest_with_qc().await?;
            let total = latest.len();
            if let Some(min_auc) = args.min_auc {
                latest = filter_by_min_auc(latest, min_auc);
            }
            let rows: Vec<LatestReportRow> = latest.iter().map(LatestReportRow::from).collect();

            if args.csv {
                write_csv(&rows, io::stdout())?;
            } else if total == 0 {
                println!("No predictions yet. Run the daily pipeline first.");
            } else if let Some(min_auc) = args.min_auc {
                print!("{}", render_latest_table(&rows));
                println!("{} of {} symbols with AUC >= {:.2}", rows.len(), total, min_auc);
            } else {
                print!("{}", render_latest_table(&rows));
            }
        }
    }
    Ok(())
}
