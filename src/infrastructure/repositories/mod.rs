pub mod in_memory;

pub use in_memory::{
    InMemoryFeatureRepository, InMemoryMetricsRepository, InMemoryPredictionRepository,
    InMemoryRawMarketDataRepository, InMemoryReportRepository,
};
