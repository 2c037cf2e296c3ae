//! Watchers over the game client's external signals.
//!
//! Provides tail-follow reading of the client log, classification of log
//! lines into semantic events, and crash-report directory observation.

mod classifier;
mod crash;
mod error;
mod tailer;

pub use classifier::{Classifier, ClassifierRules, LogEvent};
pub use crash::{CrashEvent, CrashWatcher};
pub use error::WatcherError;
pub use tailer::LogTailer;
