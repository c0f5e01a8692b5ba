//! Daily pipeline stage retry settings.

use super::parse_env;
use crate::domain::errors::ConfigError;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PipelineEnvConfig {
    /// Extra attempts per stage after the first failure
    pub stage_retries: u32,
    pub stage_retry_delay: Duration,
}

impl Default for PipelineEnvConfig {
    fn default() -> Self {
        Self {
            stage_retries: 1,
            stage_retry_delay: Duration::from_secs(300),
        }
    }
}

impl PipelineEnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            stage_retries: parse_env("STAGE_RETRIES", 1u32)?,
            stage_retry_delay: Duration::from_secs(parse_env("STAGE_RETRY_DELAY_SECS", 300u64)?),
        })
    }
}
