//! Ingest, build features, then train and infer. Each stage is retried on
//! failure; a stage that keeps failing stops the pipeline.

use anyhow::Context;
use clap::Parser;
use marketpulse::application::bootstrap::{PersistenceBootstrap, ServicesBootstrap, stages};
use marketpulse::application::pipeline::run_stage_with_retry;
use marketpulse::config::Config;
use marketpulse::infrastructure::observability::{emit_run_summary, init_tracing};
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the full daily MarketPulse pipeline")]
struct Args {
    /// Skip the ingestion stage and work from the raw tables as they are
    #[arg(long)]
    skip_ingest: bool,

    /// Extra attempts per stage, overrides STAGE_RETRIES
    #[arg(long)]
    retries: Option<u32>,

    /// Seconds between attempts, overrides STAGE_RETRY_DELAY_SECS
    #[arg(long)]
    retry_delay_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(retries) = args.retries {
        config.pipeline.stage_retries = retries;
    }
    if let Some(secs) = args.retry_delay_secs {
        config.pipeline.stage_retry_delay = Duration::from_secs(secs);
    }
    init_tracing(&config.observability);

    let retries = config.pipeline.stage_retries;
    let delay = config.pipeline.stage_retry_delay;
    let persistence = PersistenceBootstrap::init(&config.warehouse).await?;

    let result = async {
        if args.skip_ingest {
            info!("Skipping ingestion");
        } else {
            let services = ServicesBootstrap::init(&config.ingestion)?;
            run_stage_with_retry("ingest", retries, delay, || {
                stages::ingest(&config, &services, &persistence)
            })
            .await?;
        }

        run_stage_with_retry("build_features", retries, delay, || {
            stages::build_features(&persistence)
        })
        .await?;

        run_stage_with_retry("train_and_infer", retries, delay, || {
            stages::train_and_infer(&config, &persistence)
        })
        .await
    }
    .await;

    match result {
        Ok(summary) => {
            emit_run_summary(&summary);
            info!("Daily pipeline finished");
            Ok(())
        }
        Err(e) => {
            error!("Daily pipeline aborted: {:#}", e);
            Err(e)
        }
    }
}
