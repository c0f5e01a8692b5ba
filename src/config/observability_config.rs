//! Observability configuration parsing from environment variables.
//!
//! Controls how log output is rendered by the binaries.

use crate::domain::errors::ConfigError;
use std::env;
use std::str::FromStr;

/// Rendering of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue {
                key: "LOG_FORMAT".to_string(),
                value: s.to_string(),
                reason: "must be 'pretty' or 'json'".to_string(),
            }),
        }
    }
}

/// Observability environment configuration
#[derive(Debug, Clone, Default)]
pub struct ObservabilityEnvConfig {
    pub log_format: LogFormat,
}

impl ObservabilityEnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let log_format = match env::var("LOG_FORMAT") {
            Ok(value) => value.parse()?,
            Err(_) => LogFormat::default(),
        };
        Ok(Self { log_format })
    }
}
