//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("cannot write fixture {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    /// Stage of the run that failed, for user-facing messages.
    pub fn stage(&self) -> &'static str {
        match self {
            ApplicationError::Domain(DomainError::Parse(_)) => "parse",
            ApplicationError::Domain(DomainError::Structural(_)) => "build",
            ApplicationError::Write { .. } => "emit",
            ApplicationError::Io { .. } => "io",
            ApplicationError::Config { .. } => "config",
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
