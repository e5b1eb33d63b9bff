use std::path::PathBuf;

use thiserror::Error;

/// Failure of one file operation. Always reported as an annotation in the
/// rewritten response, never as a session-level error.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("Invalid path: must stay inside the project root: {path}")]
    PathSecurityViolation { path: String },

    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("I/O error while {action} {path}: {source}")]
    IoFailure {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No active project selected")]
    NoActiveProject,
}

impl OperationError {
    #[must_use]
    pub fn violation(path: impl Into<String>) -> Self {
        Self::PathSecurityViolation { path: path.into() }
    }

    #[must_use]
    pub fn io(action: &'static str, path: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoFailure {
            action,
            path: path.into(),
            source,
        }
    }

    /// Like [`OperationError::io`] but maps a missing file to `NotFound`.
    #[must_use]
    pub fn from_io(action: &'static str, path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::io(action, path, source)
        }
    }
}

/// Failure to build a session or a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
