//! Game action error types.

use crate::window::{FocusError, PlatformError};

/// Errors raised by game client operations.
///
/// All of these are recoverable at the watchdog level: actions are logged
/// and retried through the policy rather than terminating the process.
#[derive(thiserror::Error, Debug)]
pub enum ActionError {
    /// The target window could not be focused.
    #[error(transparent)]
    Focus(#[from] FocusError),

    /// Simulated input or capture failed at the OS level.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The launcher executable could not be started.
    #[error("Failed to start launcher: {0}")]
    Launch(#[source] std::io::Error),
}
