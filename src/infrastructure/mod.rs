pub mod core;
pub mod finnhub;
pub mod mock;
pub mod news;
pub mod observability;
pub mod persistence;
pub mod repositories;
pub mod yahoo;

pub use repositories::{
    InMemoryFeatureRepository, InMemoryMetricsRepository, InMemoryPredictionRepository,
    InMemoryRawMarketDataRepository, InMemoryReportRepository,
};
