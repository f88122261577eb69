//! Error types shared by the backends, the store and the update command.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateError {
    /// A required backend setting is missing or invalid.
    #[error("Improperly configured: {0}")]
    Config(String),
    /// The provider could not be reached or returned something unexpected.
    #[error("Error retrieving rates: {0}")]
    Provider(String),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(#[from] fjall::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures surfaced by the `update` command to the user.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Cannot parse {0}. Unrecognized date format.")]
    InvalidDate(String),
    #[error("Cannot find custom backend {0}. Is it correct?")]
    UnknownBackend(String),
    #[error("Error during rate update: {0}")]
    Update(#[source] RateError),
}
