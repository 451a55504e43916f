//! Error types for metric collection.

use thiserror::Error;

/// Failures while reading or deriving a single metric category.
///
/// None of these are fatal: the assembler logs them and degrades the affected
/// category to an empty/zero value for that tick.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("listing command exited with {status}")]
    CommandFailed { status: String },

    #[error("process listing is not supported on '{0}'")]
    UnsupportedPlatform(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
