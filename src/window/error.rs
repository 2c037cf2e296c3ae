//! Window and platform error types.

/// Errors from the raw OS windowing/input surface.
#[derive(thiserror::Error, Debug)]
pub enum PlatformError {
    /// Platform support is not compiled in (non-Windows build).
    #[error("Window operations are not supported on this platform")]
    Unsupported,

    /// A winapi call failed.
    #[error("Platform call failed: {0}")]
    Api(String),

    /// I/O error writing a capture to disk.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a focus attempt.
///
/// Focus failures are recoverable-but-reported: callers log them and may
/// proceed degraded, they never terminate the process.
#[derive(thiserror::Error, Debug)]
pub enum FocusError {
    /// No top-level window title matched the pattern.
    #[error("No window matching pattern '{0}'")]
    WindowNotFound(String),

    /// The activation sequence failed at the OS level.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}
