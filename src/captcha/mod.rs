//! Captcha detection and alerting.
//!
//! [`CaptchaMonitor`] tails the macro mod's alerts file and, for each new
//! alert, captures the game window and pushes photo plus text through an
//! [`AlertSink`].

mod monitor;
mod sink;

pub use monitor::CaptchaMonitor;
pub use sink::{AlertError, AlertSink, LogSink};
