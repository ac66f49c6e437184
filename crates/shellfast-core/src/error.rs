//! Error types for `shellfast-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`. Every variant that concerns
//! a filesystem object carries the offending path.

use std::io;
use std::path::{Path, PathBuf};

/// Unified error type for all core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The target path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A directory was expected but the path points to something else.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A file was expected but the path points to a directory.
    #[error("is a directory: {0}")]
    IsADirectory(PathBuf),

    /// The destination path is already taken.
    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    /// A directory could not be removed because it still has children.
    #[error("directory not empty: {0}")]
    NotEmpty(PathBuf),

    /// A pattern, field spec, delimiter or option combination is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Following symlinks led back into a directory already on the walk stack.
    #[error("symlink cycle detected: {0}")]
    CycleDetected(PathBuf),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// An I/O error that doesn't fit a more specific variant.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The shared error-kind vocabulary, independent of payloads.
///
/// Collaborators outside the core (OS facts, process table, network checks)
/// report failures with the same kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    NotADirectory,
    IsADirectory,
    AlreadyExists,
    NotEmpty,
    InvalidArgument,
    CycleDetected,
    IoError,
}

impl CoreError {
    /// Classifies an `io::Error` raised while operating on `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => CoreError::NotFound(path),
            io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path),
            io::ErrorKind::AlreadyExists => CoreError::AlreadyExists(path),
            io::ErrorKind::NotADirectory => CoreError::NotADirectory(path),
            io::ErrorKind::IsADirectory => CoreError::IsADirectory(path),
            io::ErrorKind::DirectoryNotEmpty => CoreError::NotEmpty(path),
            _ => CoreError::Io { path, source: err },
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            CoreError::NotADirectory(_) => ErrorKind::NotADirectory,
            CoreError::IsADirectory(_) => ErrorKind::IsADirectory,
            CoreError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            CoreError::NotEmpty(_) => ErrorKind::NotEmpty,
            CoreError::InvalidArgument(_) | CoreError::ConfigParse(_) => {
                ErrorKind::InvalidArgument
            }
            CoreError::CycleDetected(_) => ErrorKind::CycleDetected,
            CoreError::Io { .. } => ErrorKind::IoError,
        }
    }

    /// Returns the offending path, if the error is about one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            CoreError::NotFound(p)
            | CoreError::PermissionDenied(p)
            | CoreError::NotADirectory(p)
            | CoreError::IsADirectory(p)
            | CoreError::AlreadyExists(p)
            | CoreError::NotEmpty(p)
            | CoreError::CycleDetected(p)
            | CoreError::Io { path: p, .. } => Some(p),
            CoreError::InvalidArgument(_) | CoreError::ConfigParse(_) => None,
        }
    }
}

/// Returns a `map_err` adapter that classifies I/O failures on `path`.
pub(crate) fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CoreError + '_ {
    move |e| CoreError::from_io(path, e)
}

/// Convenience alias used throughout `shellfast-core`.
pub type CoreResult<T> = Result<T, CoreError>;
