//! Yahoo Finance chart API (daily price bars)

pub mod common;
pub mod market_data;

pub use market_data::YahooMarketDataService;
