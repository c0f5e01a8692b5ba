use anyhow::Context;
use marketpulse::application::bootstrap::{PersistenceBootstrap, stages};
use marketpulse::config::Config;
use marketpulse::infrastructure::observability::{emit_run_summary, init_tracing};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.observability);

    info!(
        "MarketPulse train-and-infer v{} (model {}, classifier {})",
        env!("CARGO_PKG_VERSION"),
        config.training.model_version,
        config.training.classifier
    );

    let persistence = PersistenceBootstrap::init(&config.warehouse).await?;

    match stages::train_and_infer(&config, &persistence).await {
        Ok(summary) => {
            emit_run_summary(&summary);
            Ok(())
        }
        Err(e) => {
            error!("Train-and-infer run failed: {:#}", e);
            Err(e)
        }
    }
}
