use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the watcher, the hub and its connections.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("connection saturated; payload dropped")]
    ConnectionSaturated,

    #[error("{task} task join failure: {message}")]
    Join { task: &'static str, message: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> LiveError {
    LiveError::Io {
        path: path.into(),
        source,
    }
}
