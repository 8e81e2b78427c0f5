//! Error types for Spendwise

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The message text did not yield a transaction; shown to the user verbatim.
    #[error("{0}")]
    Extraction(String),

    #[error("{dependency} unavailable: {message}")]
    ExternalDependency {
        dependency: &'static str,
        message: String,
    },

    #[error("{dependency} timed out after {timeout_ms}ms")]
    Timeout {
        dependency: &'static str,
        timeout_ms: u64,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn external(dependency: &'static str, err: impl std::fmt::Display) -> Self {
        Error::ExternalDependency {
            dependency,
            message: err.to_string(),
        }
    }

    /// True for failures of a collaborator (unreachable or too slow)
    pub fn is_external(&self) -> bool {
        matches!(self, Error::ExternalDependency { .. } | Error::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
