use anyhow::Context;
use marketpulse::application::bootstrap::{PersistenceBootstrap, stages};
use marketpulse::config::Config;
use marketpulse::infrastructure::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.observability);

    let persistence = PersistenceBootstrap::init(&config.warehouse).await?;
    stages::build_features(&persistence).await?;
    Ok(())
}
