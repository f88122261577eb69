//! Core types and abstractions

pub mod cache;
pub mod config;
pub mod error;
pub mod log;
pub mod rate;

// Re-export main types for cleaner imports
pub use cache::Cache;
pub use error::{CommandError, RateError};
pub use rate::{Rate, RateBackend, RateSource};
