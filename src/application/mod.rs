// Binary wiring: warehouse, provider clients and the daily stages
pub mod bootstrap;

// Raw data ingestion from the market, news and earnings providers
pub mod ingestion;

// Daily feature table construction
pub mod feature_engineering_service;

// Per-symbol training, evaluation and inference
pub mod ml;

// Batch jobs and stage orchestration
pub mod pipeline;

// Report rendering (terminal table and CSV)
pub mod reporting;
