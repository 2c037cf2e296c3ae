//! Watchdog configuration.
//!
//! Typed settings for paths, window patterns, input coordinates, and
//! policy bounds, loadable from a TOML file with sensible defaults.

mod loader;
mod types;

pub use loader::{ConfigError, ConfigLoader};
pub use types::{
    ButtonsConfig, CaptchaSettings, InputSettings, PathsConfig, ProcessSettings,
    ReconnectSettings, WatchConfig, WindowSettings,
};
