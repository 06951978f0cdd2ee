//! Error types for YAML parsing with source locations.

use crate::SourceInfo;
use thiserror::Error;

/// Result type alias for strata-yaml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during YAML parsing.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// YAML syntax error reported by the scanner.
    #[error("YAML syntax error: {message}")]
    Syntax { message: String },

    /// The input contained no YAML document.
    #[error("no YAML document found")]
    EmptyDocument,

    /// An alias referenced an anchor that was never defined.
    #[error("unknown anchor referenced at {}", .location.display())]
    UnknownAnchor { location: SourceInfo },
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        Error::Syntax {
            message: err.to_string(),
        }
    }
}
