// Errors
pub mod errors;

// Feature layout shared by training, inference and the feature builder
pub mod ml;

// Ports to external data sources
pub mod ports;

// Warehouse abstractions
pub mod repositories;

pub mod types;
