use crate::config::{LogFormat, ObservabilityEnvConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// `RUST_LOG` when set and valid, `info` otherwise.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber for a binary.
pub fn init_tracing(config: &ObservabilityEnvConfig) {
    let filter = env_filter();

    match config.log_format {
        LogFormat::Pretty => {
            let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .init();
        }
        LogFormat::Json => {
            let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).json();
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .init();
        }
    }
}
