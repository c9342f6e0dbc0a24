//! Error types for taskboard-core.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// What kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Board,
    Card,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Board => write!(f, "board"),
            Resource::Card => write!(f, "card"),
        }
    }
}

/// Coarse classification used at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Internal,
}

/// All errors that can arise from store and service operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested board or card record is absent.
    #[error("{resource} {id} not found")]
    NotFound { resource: Resource, id: String },

    /// A business rule rejected the input.
    #[error("validation error: {field} {message}")]
    Validation { field: String, message: String },

    /// A record with the same id already exists.
    #[error("{resource} {id} already exists")]
    Conflict { resource: Resource, id: String },

    /// Underlying filesystem failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record file exists but does not parse.
    #[error("failed to parse record at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML serialization error (write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl StoreError {
    pub fn not_found(resource: Resource, id: impl fmt::Display) -> Self {
        StoreError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(resource: Resource, id: impl fmt::Display) -> Self {
        StoreError::Conflict {
            resource,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Validation { .. } => ErrorKind::Validation,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::Io { .. } | StoreError::Parse { .. } | StoreError::Yaml(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_record_vocabulary() {
        assert_eq!(
            StoreError::not_found(Resource::Card, "123").to_string(),
            "card 123 not found"
        );
        assert_eq!(
            StoreError::validation("title", "is required").to_string(),
            "validation error: title is required"
        );
        assert_eq!(
            StoreError::conflict(Resource::Board, "b1").to_string(),
            "board b1 already exists"
        );
    }

    #[test]
    fn io_errors_are_internal() {
        let err = io_err("/x", std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("/x"));
    }
}
