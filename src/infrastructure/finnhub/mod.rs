//! Finnhub REST API (company news and earnings)

pub mod client;
pub mod common;

pub use client::FinnhubClient;
