//! Watcher error types.

use std::path::PathBuf;

/// Errors that can occur while watching the game client's log and crash output.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Watched file does not exist.
    #[error("Watched file missing: {0}")]
    FileMissing(PathBuf),

    /// Permission denied accessing a watched path.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Notify watcher error.
    #[error("Filesystem watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
