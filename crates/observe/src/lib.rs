//! This crate is intended to contain code that is required to provide or
//! improve the observability of the service. That includes initialization
//! logic for metrics and logging as well as logging helper functions.
pub mod config;
pub mod distributed_tracing;
pub mod metrics;
pub mod tracing;

pub use config::Config;
