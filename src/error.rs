// Centralized error handling module
// Startup validation failures and per-entry filesystem failures share one type

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Main error type for synchronization
/// Every variant carries the path it concerns so failures can be logged as one line
#[derive(Debug)]
pub enum SyncError {
    /// Startup errors, fatal before the sync loop starts
    SourceMissing { path: PathBuf },
    SourceNotDirectory { path: PathBuf },
    ReplicaNotDirectory { path: PathBuf },
    OverlappingRoots { source: PathBuf, replica: PathBuf },

    /// File system errors with context
    NotFound { path: PathBuf, operation: String },
    PermissionDenied { path: PathBuf, operation: String },
    Io { path: PathBuf, operation: String, source: io::Error },

    /// The pass was stopped at an entry boundary by a shutdown request
    Interrupted,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyncError::SourceMissing { path } => {
                write!(f, "Source folder '{}' does not exist!", path.display())
            }
            SyncError::SourceNotDirectory { path } => {
                write!(f, "Source path '{}' is not a folder!", path.display())
            }
            SyncError::ReplicaNotDirectory { path } => {
                write!(f, "Replica path '{}' exists but is not a folder!", path.display())
            }
            SyncError::OverlappingRoots { source, replica } => write!(
                f,
                "Source '{}' and replica '{}' must not contain one another",
                source.display(),
                replica.display()
            ),
            SyncError::NotFound { path, operation } => {
                write!(f, "Path vanished while {}: {}", operation, path.display())
            }
            SyncError::PermissionDenied { path, operation } => {
                write!(f, "Permission denied while {}: {}", operation, path.display())
            }
            SyncError::Io { path, operation, source } => {
                write!(f, "I/O error while {} {}: {}", operation, path.display(), source)
            }
            SyncError::Interrupted => write!(f, "Synchronization interrupted by shutdown request"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl SyncError {
    /// Create an error with context about the operation and the path it touched
    pub fn from_io_error(err: io::Error, operation: &str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => SyncError::NotFound {
                path,
                operation: operation.to_string(),
            },
            io::ErrorKind::PermissionDenied => SyncError::PermissionDenied {
                path,
                operation: operation.to_string(),
            },
            _ => SyncError::Io {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    /// Whether this error belongs to the startup checks (process exits with status 1)
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            SyncError::SourceMissing { .. }
                | SyncError::SourceNotDirectory { .. }
                | SyncError::ReplicaNotDirectory { .. }
                | SyncError::OverlappingRoots { .. }
        )
    }
}
