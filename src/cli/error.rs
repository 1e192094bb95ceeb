//! CLI-level errors (wraps infrastructure errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("fixture is stale: {0}")]
    Stale(PathBuf),

    #[error("fixture is missing: {0}")]
    Missing(PathBuf),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Stale(_) | CliError::Missing(_) => crate::exitcode::STALE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                    ApplicationError::Write { .. } => crate::exitcode::CANTCREAT,
                    ApplicationError::Io { .. } => crate::exitcode::IOERR,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                },
            },
        }
    }

    /// Stage label shown in front of the message.
    pub fn stage(&self) -> &'static str {
        match self {
            CliError::InvalidArgs(_) => "usage",
            CliError::Stale(_) | CliError::Missing(_) => "check",
            CliError::Infra(InfraError::Io { .. }) => "io",
            CliError::Infra(InfraError::Application(app)) => app.stage(),
        }
    }
}
