//! Incremental plain-text log tailer.
//!
//! Reads newly appended lines from a growing log file, tracking a byte
//! offset between reads. Polling cadence is owned by the caller.

use std::path::PathBuf;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

use super::error::WatcherError;

/// Incremental line reader that tracks read position.
///
/// Suitable for tail-follow consumption of append-only log files: each
/// call to [`read_new_lines`](Self::read_new_lines) returns only the lines
/// appended since the previous call.
#[derive(Debug)]
pub struct LogTailer {
    /// Path to the log file.
    path: PathBuf,
    /// Current byte offset in the file.
    offset: u64,
}

impl LogTailer {
    /// Create a new tailer starting at the beginning of the file.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path, offset: 0 }
    }

    /// Create a tailer positioned at the current end of the file.
    ///
    /// This is the follow-mode constructor: historical content is skipped
    /// and only lines appended after this call are reported.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::FileMissing`] if the file does not exist,
    /// which callers treat as a startup failure for the owning watcher.
    pub async fn from_end(path: impl Into<PathBuf>) -> Result<Self, WatcherError> {
        let path = path.into();
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WatcherError::FileMissing(path));
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(WatcherError::PermissionDenied(path));
            }
            Err(e) => return Err(WatcherError::Io(e)),
        };
        Ok(Self {
            path,
            offset: metadata.len(),
        })
    }

    /// Get the current byte offset.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Get the path being tailed.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read lines appended since the last read.
    ///
    /// Returns an empty vector when the file has not grown. Only
    /// newline-terminated lines are returned: a partially flushed final
    /// line stays in the file until a later poll sees it complete.
    /// Trailing newlines are stripped; blank lines are skipped.
    ///
    /// If the file is now smaller than our offset (truncation or rotation
    /// into a fresh file), the offset resets to 0 and reading restarts
    /// from the beginning of the new content.
    ///
    /// # Errors
    ///
    /// Returns an error if the file has disappeared or cannot be read.
    pub async fn read_new_lines(&mut self) -> Result<Vec<String>, WatcherError> {
        let file = match File::open(&self.path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WatcherError::FileMissing(self.path.clone()));
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(WatcherError::PermissionDenied(self.path.clone()));
            }
            Err(e) => return Err(WatcherError::Io(e)),
        };

        let metadata = file.metadata().await?;
        let file_len = metadata.len();

        if file_len < self.offset {
            tracing::warn!(
                path = %self.path.display(),
                old_offset = self.offset,
                new_len = file_len,
                "Log file truncated, resetting offset to 0"
            );
            self.offset = 0;
        }

        if file_len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = file;
        file.seek(std::io::SeekFrom::Start(self.offset)).await?;

        let mut reader = BufReader::new(file);
        let mut lines = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                break;
            }

            // A fragment without a newline is a partial flush. Leave it
            // in place so the next poll reads the completed line whole.
            if !line.ends_with('\n') {
                break;
            }

            self.offset += bytes_read as u64;

            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                continue;
            }
            lines.push(trimmed.to_string());
        }

        Ok(lines)
    }

    /// Reset the offset to the beginning of the file.
    pub fn reset(&mut self) {
        self.offset = 0;
    }
}
