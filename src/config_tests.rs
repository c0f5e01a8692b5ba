use crate::application::ml::classifier::ClassifierKind;
use crate::config::{Config, LogFormat};
use crate::infrastructure::observability::env_filter;
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

const KEYS: [&str; 17] = [
    "DATABASE_URL",
    "DATABASE_MAX_CONNECTIONS",
    "MODEL_VERSION",
    "LOOKBACK_DAYS",
    "MIN_ROWS_PER_SYMBOL",
    "MODEL_CLASSIFIER",
    "TRAIN_PARALLEL",
    "FINNHUB_API_KEY",
    "FINNHUB_BASE_URL",
    "YAHOO_BASE_URL",
    "SYMBOLS",
    "NEWS_DAYS_BACK",
    "PRICE_RANGE",
    "STAGE_RETRIES",
    "STAGE_RETRY_DELAY_SECS",
    "LOG_FORMAT",
    "RUST_LOG",
];

fn clear_env() {
    for key in KEYS {
        // SAFETY: env access is serialised by ENV_LOCK
        unsafe { env::remove_var(key) };
    }
}

fn set(key: &str, value: &str) {
    // SAFETY: env access is serialised by ENV_LOCK
    unsafe { env::set_var(key, value) };
}

#[test]
fn test_config_from_env_defaults() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    let config = Config::from_env().expect("Should parse with defaults");

    assert_eq!(config.warehouse.database_url, "sqlite://marketpulse.db");
    assert_eq!(config.warehouse.max_connections, 5);
    assert_eq!(config.training.model_version, "v1");
    assert_eq!(config.training.lookback_days, 730);
    assert_eq!(config.training.min_rows_per_symbol, 12);
    assert_eq!(config.training.classifier, ClassifierKind::BalancedLogistic);
    assert!(!config.training.parallel);
    assert_eq!(config.ingestion.symbols, vec!["AAPL", "MSFT", "GOOGL", "AMZN"]);
    assert_eq!(config.ingestion.news_days_back, 30);
    assert_eq!(config.ingestion.price_range, "1mo");
    assert_eq!(config.pipeline.stage_retries, 1);
    assert_eq!(config.pipeline.stage_retry_delay, Duration::from_secs(300));
    assert_eq!(config.observability.log_format, LogFormat::Pretty);
}

#[test]
fn test_config_overrides() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();
    set("DATABASE_URL", "sqlite::memory:");
    set("MODEL_VERSION", "v7");
    set("LOOKBACK_DAYS", "365");
    set("MIN_ROWS_PER_SYMBOL", "30");
    set("MODEL_CLASSIFIER", "smartcore_logistic");
    set("TRAIN_PARALLEL", "true");
    set("SYMBOLS", "nvda, tsla");
    set("STAGE_RETRY_DELAY_SECS", "0");
    set("LOG_FORMAT", "json");

    let config = Config::from_env().unwrap();

    assert_eq!(config.warehouse.database_url, "sqlite::memory:");
    assert_eq!(config.training.model_version, "v7");
    assert_eq!(config.training.lookback_days, 365);
    assert_eq!(config.training.min_rows_per_symbol, 30);
    assert_eq!(config.training.classifier, ClassifierKind::SmartcoreLogistic);
    assert!(config.training.parallel);
    assert_eq!(config.ingestion.symbols, vec!["NVDA", "TSLA"]);
    assert_eq!(config.pipeline.stage_retry_delay, Duration::ZERO);
    assert_eq!(config.observability.log_format, LogFormat::Json);

    let trainer = config.training.trainer_config();
    assert_eq!(trainer.min_rows, 30);
    assert_eq!(trainer.model_version, "v7");

    clear_env();
}

#[test]
fn test_invalid_numeric_value_is_rejected() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();
    set("LOOKBACK_DAYS", "two years");

    let err = Config::from_env().unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("LOOKBACK_DAYS"), "{}", message);

    clear_env();
}

#[test]
fn test_unknown_classifier_is_rejected() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();
    set("MODEL_CLASSIFIER", "random_forest");

    assert!(Config::from_env().is_err());

    clear_env();
}

#[test]
fn test_blank_values_fall_back_to_defaults() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();
    set("MIN_ROWS_PER_SYMBOL", "  ");
    set("SYMBOLS", "");

    let config = Config::from_env().unwrap();
    assert_eq!(config.training.min_rows_per_symbol, 12);
    assert_eq!(config.ingestion.symbols.len(), 4);

    clear_env();
}

#[test]
fn test_log_filter_follows_rust_log() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    assert_eq!(env_filter().max_level_hint(), Some(LevelFilter::INFO));

    set("RUST_LOG", "warn");
    assert_eq!(env_filter().max_level_hint(), Some(LevelFilter::WARN));

    set("RUST_LOG", "debug");
    assert_eq!(env_filter().max_level_hint(), Some(LevelFilter::DEBUG));

    clear_env();
}
