//! Window location, foreground activation, and screen capture.
//!
//! [`WindowController`] resolves a target window by title pattern and
//! brings it to the foreground with bounded retries. The raw OS surface
//! sits behind the [`Platform`] trait so the rest of the crate (and its
//! tests) never touch the winapi directly.

mod controller;
mod error;
mod platform;
mod retry;

pub use controller::WindowController;
pub use error::{FocusError, PlatformError};
pub use platform::{Key, NativePlatform, Platform, Point, Rect, WindowHandle};
pub use retry::retry_bounded;

use std::time::Duration;

/// Number of resolve+activate attempts before focus fails.
pub const FOCUS_ATTEMPTS: u32 = 3;

/// Fixed wait between focus attempts.
pub const FOCUS_RETRY_WAIT: Duration = Duration::from_secs(3);
