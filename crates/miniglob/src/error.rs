use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while compiling patterns or walking the filesystem.
#[derive(Debug, Error)]
pub enum GlobError {
    /// Malformed pattern syntax, rejected before any matching takes place.
    #[error("invalid pattern `{pattern}` at byte {offset}: {reason}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// Byte offset of the construct that failed to parse.
        offset: usize,
        /// What went wrong at that position.
        reason: String,
    },

    /// Brace expansion produced more alternatives than the configured limit.
    #[error("pattern `{pattern}` expands to more than {limit} alternatives")]
    TooComplex {
        /// The offending pattern text.
        pattern: String,
        /// The alternative limit that was exceeded.
        limit: usize,
    },

    /// Contradictory traversal options, rejected before any I/O.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// A directory could not be read and the caller asked to fail fast.
    #[error("failed to read `{path}`")]
    Walk {
        /// The directory that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The cancellation token fired mid-traversal; partial results are discarded.
    #[error("glob traversal was cancelled")]
    Cancelled,
}

impl GlobError {
    pub(crate) fn invalid(pattern: &str, offset: usize, reason: impl Into<String>) -> Self {
        GlobError::InvalidPattern {
            pattern: pattern.to_string(),
            offset,
            reason: reason.into(),
        }
    }
}
