//! Error types for attachment retrieval.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading attachment content.
///
/// Content that cannot be previewed is not an error; see
/// [`Preview::Unavailable`](crate::store::Preview::Unavailable).
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// The referenced file is missing or the path is stale.
    #[error("attachment file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read attachment file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AttachmentError {
    pub(crate) fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            AttachmentError::NotFound { path }
        } else {
            AttachmentError::Io { path, source }
        }
    }
}

/// Result type alias for attachment operations.
pub type AttachmentResult<T> = std::result::Result<T, AttachmentError>;
