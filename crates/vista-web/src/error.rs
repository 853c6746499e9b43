use std::path::PathBuf;
use thiserror::Error;
use vista_proto::ReportError;

/// Errors raised while loading a report or running the server.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to load report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: ReportError,
    },

    #[error("report cannot be bound: {0}")]
    Bind(#[source] ReportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
