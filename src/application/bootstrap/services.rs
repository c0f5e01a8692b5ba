use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::IngestionEnvConfig;
use crate::domain::ports::{EarningsDataService, MarketDataService, NewsDataService};
use crate::infrastructure::finnhub::FinnhubClient;
use crate::infrastructure::yahoo::YahooMarketDataService;

pub struct ServicesHandle {
    pub market_data: Arc<dyn MarketDataService>,
    pub news: Arc<dyn NewsDataService>,
    pub earnings: Arc<dyn EarningsDataService>,
}

pub struct ServicesBootstrap;

impl ServicesBootstrap {
    /// Live provider clients. Fails early when the Finnhub key is missing.
    pub fn init(config: &IngestionEnvConfig) -> Result<ServicesHandle> {
        let api_key = config
            .require_finnhub_key()
            .context("Ingestion needs a Finnhub API key")?;

        let finnhub = Arc::new(FinnhubClient::new(
            config.finnhub_base_url.clone(),
            api_key.to_string(),
        ));

        Ok(ServicesHandle {
            market_data: Arc::new(YahooMarketDataService::new(config.yahoo_base_url.clone())),
            news: finnhub.clone(),
            earnings: finnhub,
        })
    }
}
