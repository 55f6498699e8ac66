//! Failures raised while wiring taskdeck to Postgres, the cache backend,
//! the log subscriber and its settings.

use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("taskdeck i/o failure: {0}")]
    Io(#[from] std::io::Error),
    /// Postgres could not be reached, migrated or queried.
    #[error("task store unavailable: {message}")]
    Store { message: String },
    #[error("cache backend could not be reached: {message}")]
    Cache { message: String },
    #[error("log subscriber could not be installed: {0}")]
    Logging(String),
    #[error("invalid taskdeck configuration: {message}")]
    Configuration { message: String },
}

impl InfraError {
    pub fn store(err: impl Display) -> Self {
        Self::Store {
            message: err.to_string(),
        }
    }

    pub fn cache(err: impl Display) -> Self {
        Self::Cache {
            message: err.to_string(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn logging(err: impl Display) -> Self {
        Self::Logging(err.to_string())
    }
}
