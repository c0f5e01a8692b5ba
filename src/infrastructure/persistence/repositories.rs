//! SQLite implementations of the warehouse repositories.

mod feature_repository;
mod model_output_repository;
mod raw_market_data_repository;
mod report_repository;

pub use feature_repository::SqliteFeatureRepository;
pub use model_output_repository::{SqliteMetricsRepository, SqlitePredictionRepository};
pub use raw_market_data_repository::SqliteRawMarketDataRepository;
pub use report_repository::SqliteReportRepository;
