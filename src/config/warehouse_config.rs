//! Warehouse connection settings.

use super::{parse_env, string_env};
use crate::domain::errors::ConfigError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://marketpulse.db";

#[derive(Debug, Clone)]
pub struct WarehouseEnvConfig {
    /// sqlx connection string, e.g. `sqlite://marketpulse.db` or `sqlite::memory:`
    pub database_url: String,
    pub max_connections: u32,
}

impl Default for WarehouseEnvConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
        }
    }
}

impl WarehouseEnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 5u32)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_MAX_CONNECTIONS".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            database_url: string_env("DATABASE_URL", DEFAULT_DATABASE_URL),
            max_connections,
        })
    }
}
