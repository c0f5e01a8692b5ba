//! Batch observability for MarketPulse
//!
//! Output only: human-readable `tracing` logs plus one prefixed JSON line per
//! run on stdout. Subscriber setup lives in `logging`.

pub mod logging;
pub mod reporter;

pub use logging::{env_filter, init_tracing};
pub use reporter::{emit_run_summary, RunSummary, RUN_SUMMARY_PREFIX};
