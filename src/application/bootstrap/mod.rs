//! Wiring shared by the binaries: warehouse repositories, provider clients
//! and the three pipeline stages built on top of them.

pub mod persistence;
pub mod services;
pub mod stages;

pub use persistence::{PersistenceBootstrap, PersistenceHandle};
pub use services::{ServicesBootstrap, ServicesHandle};
