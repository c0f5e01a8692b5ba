//! Configuration module for MarketPulse.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Warehouse, Training, Ingestion, Pipeline, and Observability.

mod ingestion_config;
mod observability_config;
mod pipeline_config;
mod training_config;
mod warehouse_config;

pub use ingestion_config::{IngestionEnvConfig, DEFAULT_SYMBOLS};
pub use observability_config::{LogFormat, ObservabilityEnvConfig};
pub use pipeline_config::PipelineEnvConfig;
pub use training_config::TrainingEnvConfig;
pub use warehouse_config::WarehouseEnvConfig;

use crate::domain::errors::ConfigError;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Main application configuration.
///
/// Built once per process with [`Config::from_env`] and handed to the entry
/// points. Nothing below the binaries reads the environment.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub warehouse: WarehouseEnvConfig,
    pub training: TrainingEnvConfig,
    pub ingestion: IngestionEnvConfig,
    pub pipeline: PipelineEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv().ok()` first to pick up a local `.env` file.
    pub fn from_env() -> Result<Self> {
        let warehouse = WarehouseEnvConfig::from_env().context("Failed to load warehouse config")?;
        let training = TrainingEnvConfig::from_env().context("Failed to load training config")?;
        let ingestion =
            IngestionEnvConfig::from_env().context("Failed to load ingestion config")?;
        let pipeline = PipelineEnvConfig::from_env().context("Failed to load pipeline config")?;
        let observability =
            ObservabilityEnvConfig::from_env().context("Failed to load observability config")?;

        Ok(Self {
            warehouse,
            training,
            ingestion,
            pipeline,
            observability,
        })
    }
}

/// Reads `key`, falling back to `default` when unset or blank.
///
/// A present but unparsable value is an error, never a silent default.
pub(crate) fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}

pub(crate) fn string_env(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
