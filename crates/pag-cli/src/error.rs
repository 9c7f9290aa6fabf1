//! Error types for pag-cli.

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

use paginar::PaginarError;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
pub enum CliError {
    /// Input or random file missing
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// Frame count outside the supported range
    #[error("invalid frame count {0}: expected 1..=128")]
    InvalidFrameCount(usize),

    /// Simulator error (parse failure, bad algorithm letter, ...)
    #[error("{0}")]
    Paginar(#[from] PaginarError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Get exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound(_) => ExitCode::from(3),
            Self::InvalidFrameCount(_) => ExitCode::from(4),
            Self::Paginar(_) => ExitCode::from(1),
            Self::Io(_) => ExitCode::from(7),
        }
    }
}
