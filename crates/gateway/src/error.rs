//! Error types for the gateway crate.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Gateway error type covering every failure an operation can report.
///
/// Path validation failures are deliberately collapsed into
/// [`GatewayError::InvalidPath`] so callers cannot distinguish which check
/// rejected a path, or whether an out-of-bounds path exists.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The path failed validation (malformed, dangerous characters, or
    /// outside the base directory).
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The operation requires a file but the target is a directory.
    #[error("path is a directory: {0}")]
    IsDirectory(PathBuf),

    /// The operation requires a directory but the target is not one.
    #[error("path is not a directory: {0}")]
    NotDirectory(PathBuf),

    /// The target does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// Any other storage error raised after validation passed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path the failing call was made on.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
}

/// Discriminant of a [`GatewayError`], for exhaustive matching without the
/// payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPath,
    IsDirectory,
    NotDirectory,
    NotFound,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidPath => "invalid path",
            ErrorKind::IsDirectory => "is a directory",
            ErrorKind::NotDirectory => "not a directory",
            ErrorKind::NotFound => "not found",
            ErrorKind::Io => "io error",
        };
        f.write_str(s)
    }
}

impl GatewayError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::InvalidPath(_) => ErrorKind::InvalidPath,
            GatewayError::IsDirectory(_) => ErrorKind::IsDirectory,
            GatewayError::NotDirectory(_) => ErrorKind::NotDirectory,
            GatewayError::NotFound(_) => ErrorKind::NotFound,
            GatewayError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Translate an OS error raised on `path` into the gateway vocabulary.
    ///
    /// `NotFound` is classified; everything else is carried as `Io`.
    pub(crate) fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => GatewayError::NotFound(path),
            _ => GatewayError::Io { path, source: err },
        }
    }
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Classification of a path validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Malformed path or forbidden characters.
    InvalidPath,
    /// The path resolves outside the base directory.
    PathTraversal,
}

/// Detailed cause of a validation failure.
///
/// This is kept for diagnostics only. It is logged and then turned into
/// [`GatewayError::InvalidPath`] before it reaches a caller.
#[derive(Debug, Error)]
#[error("{reason}: {path}")]
pub struct ValidationError {
    /// Which class of check failed.
    pub kind: ValidationErrorKind,
    /// Human-readable reason.
    pub reason: &'static str,
    /// The path as supplied by the caller.
    pub path: String,
    /// The OS error that triggered the rejection, if any.
    #[source]
    pub source: Option<io::Error>,
}

impl ValidationError {
    pub(crate) fn invalid(path: &str, reason: &'static str) -> Self {
        Self {
            kind: ValidationErrorKind::InvalidPath,
            reason,
            path: path.to_string(),
            source: None,
        }
    }

    pub(crate) fn traversal(path: &str, reason: &'static str) -> Self {
        Self {
            kind: ValidationErrorKind::PathTraversal,
            reason,
            path: path.to_string(),
            source: None,
        }
    }

    pub(crate) fn with_source(mut self, source: io::Error) -> Self {
        self.source = Some(source);
        self
    }
}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        tracing::debug!(
            kind = ?err.kind,
            reason = err.reason,
            path = %err.path,
            source = ?err.source,
            "path rejected"
        );
        GatewayError::InvalidPath(err.path)
    }
}
