//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("company hierarchy not initialized")]
    NotInitialized,

    #[error("{}:{line}: {message}", path.display())]
    Load {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    pub(crate) fn load(path: &std::path::Path, line: usize, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
