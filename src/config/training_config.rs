//! Training and inference settings.

use super::{parse_env, string_env};
use crate::application::ml::classifier::ClassifierKind;
use crate::application::ml::trainer::{TrainerConfig, DEFAULT_MIN_ROWS};
use crate::domain::errors::ConfigError;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 730;

#[derive(Debug, Clone)]
pub struct TrainingEnvConfig {
    pub model_version: String,
    /// Calendar days of feature history, counted back from the latest date
    pub lookback_days: i64,
    pub min_rows_per_symbol: usize,
    pub classifier: ClassifierKind,
    pub parallel: bool,
}

impl Default for TrainingEnvConfig {
    fn default() -> Self {
        Self {
            model_version: "v1".to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            min_rows_per_symbol: DEFAULT_MIN_ROWS,
            classifier: ClassifierKind::BalancedLogistic,
            parallel: false,
        }
    }
}

impl TrainingEnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookback_days = parse_env("LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS)?;
        if lookback_days < 1 {
            return Err(ConfigError::InvalidValue {
                key: "LOOKBACK_DAYS".to_string(),
                value: lookback_days.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            model_version: string_env("MODEL_VERSION", "v1"),
            lookback_days,
            min_rows_per_symbol: parse_env("MIN_ROWS_PER_SYMBOL", DEFAULT_MIN_ROWS)?,
            classifier: parse_env("MODEL_CLASSIFIER", ClassifierKind::BalancedLogistic)?,
            parallel: parse_env("TRAIN_PARALLEL", false)?,
        })
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            min_rows: self.min_rows_per_symbol,
            model_version: self.model_version.clone(),
            parallel: self.parallel,
        }
    }
}
