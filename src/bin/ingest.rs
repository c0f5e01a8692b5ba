use anyhow::Context;
use clap::Parser;
use marketpulse::application::bootstrap::{PersistenceBootstrap, ServicesBootstrap, stages};
use marketpulse::config::Config;
use marketpulse::infrastructure::observability::init_tracing;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch prices, news and earnings into the raw tables")]
struct Args {
    /// Comma separated symbols, overrides SYMBOLS
    #[arg(long, value_delimiter = ',')]
    symbols: Option<Vec<String>>,

    /// Yahoo chart range (e.g. 1mo, 6mo, 2y), overrides PRICE_RANGE
    #[arg(long)]
    range: Option<String>,

    /// Days of company news to fetch, overrides NEWS_DAYS_BACK
    #[arg(long)]
    news_days: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(symbols) = args.symbols {
        config.ingestion.symbols = symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(range) = args.range {
        config.ingestion.price_range = range;
    }
    if let Some(days) = args.news_days {
        config.ingestion.news_days_back = days;
    }
    init_tracing(&config.observability);

    let services = ServicesBootstrap::init(&config.ingestion)?;
    let persistence = PersistenceBootstrap::init(&config.warehouse).await?;

    let report = stages::ingest(&config, &services, &persistence).await?;
    let totals = report.totals();
    info!(
        "Inserted {} price rows, {} news rows, {} earnings rows",
        totals.prices, totals.news, totals.earnings
    );
    Ok(())
}
