//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level watchdog configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub paths: PathsConfig,
    pub window: WindowSettings,
    pub process: ProcessSettings,
    pub input: InputSettings,
    pub reconnect: ReconnectSettings,
    pub captcha: CaptchaSettings,
}

/// Filesystem paths the watchdog observes and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// The client's live log file.
    pub client_log: PathBuf,
    /// Directory where the client writes crash reports.
    pub crash_dir: PathBuf,
    /// Alert log written by the macro mod when a captcha appears.
    pub captcha_alerts: PathBuf,
    /// Directory for timestamped captcha screenshots.
    pub captcha_samples_dir: PathBuf,
    /// Absolute path of the launcher executable.
    pub launcher_exe: PathBuf,
}

fn minecraft_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".minecraft")
}

impl Default for PathsConfig {
    fn default() -> Self {
        let minecraft = minecraft_dir();
        let macros = minecraft.join("liteconfig/common/macros");
        Self {
            client_log: minecraft.join("logs/latest.log"),
            crash_dir: minecraft.join("crash-reports"),
            captcha_alerts: macros.join("logs/CaptchaAlerts.txt"),
            captcha_samples_dir: PathBuf::from("CaptchaSamples"),
            launcher_exe: PathBuf::from(
                r"C:\Program Files (x86)\Minecraft\MinecraftLauncher.exe",
            ),
        }
    }
}

/// Window title patterns and focus retry bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Regex matched against the game window title.
    pub game_title_pattern: String,
    /// Regex matched against the launcher window title.
    pub launcher_title_pattern: String,
    /// Resolve+activate attempts before a focus call fails.
    pub focus_attempts: u32,
    /// Seconds between focus attempts.
    pub focus_retry_wait_secs: u64,
}

impl WindowSettings {
    #[must_use]
    pub fn focus_retry_wait(&self) -> Duration {
        Duration::from_secs(self.focus_retry_wait_secs)
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            game_title_pattern: r"Minecraft \d+(\.\d+)*".to_string(),
            launcher_title_pattern: "Minecraft Launcher".to_string(),
            focus_attempts: 3,
            focus_retry_wait_secs: 3,
        }
    }
}

/// Process names and load-time budgets for relaunching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSettings {
    /// Exact executable name of the game process.
    pub game_process: String,
    /// Exact executable name of the launcher process.
    pub launcher_process: String,
    /// Seconds to wait for the launcher to come up.
    pub launcher_load_secs: u64,
    /// Seconds to wait for the game client to load a world.
    pub game_load_secs: u64,
}

impl ProcessSettings {
    #[must_use]
    pub fn launcher_load(&self) -> Duration {
        Duration::from_secs(self.launcher_load_secs)
    }

    #[must_use]
    pub fn game_load(&self) -> Duration {
        Duration::from_secs(self.game_load_secs)
    }
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            game_process: "javaw.exe".to_string(),
            launcher_process: "MinecraftLauncher.exe".to_string(),
            launcher_load_secs: 15,
            game_load_secs: 60,
        }
    }
}

/// Screen coordinates of the in-game buttons driven by recovery clicks.
///
/// These depend on screen resolution and must be adjusted per machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonsConfig {
    pub back_to_server_list: (i32, i32),
    pub disconnect: (i32, i32),
    pub multiplayer: (i32, i32),
    pub server: (i32, i32),
    pub join_server: (i32, i32),
    pub play: (i32, i32),
}

impl Default for ButtonsConfig {
    fn default() -> Self {
        Self {
            back_to_server_list: (963, 575),
            disconnect: (960, 505),
            multiplayer: (950, 440),
            server: (935, 130),
            join_server: (750, 950),
            play: (1050, 1000),
        }
    }
}

/// Keybinds and input pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Macro mod keybind: refresh.
    pub refresh_key: char,
    /// Macro mod keybind: reload macro config.
    pub config_key: char,
    /// Macro mod keybind: reset mining stats.
    pub reset_stats_key: char,
    /// Vanilla chat-open key.
    pub chat_key: char,
    /// Milliseconds to wait after each keystroke.
    pub key_delay_millis: u64,
    pub buttons: ButtonsConfig,
}

impl InputSettings {
    #[must_use]
    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_millis)
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            refresh_key: 'r',
            config_key: 'c',
            reset_stats_key: 'p',
            chat_key: 't',
            key_delay_millis: 1000,
            buttons: ButtonsConfig::default(),
        }
    }
}

/// Reconnect policy bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectSettings {
    /// Lightweight reconnects before escalating to a relaunch.
    pub max_tries: u32,
    /// Seconds between tail polls of the client log.
    pub poll_interval_secs: u64,
}

impl ReconnectSettings {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            max_tries: 5,
            poll_interval_secs: 2,
        }
    }
}

/// Captcha alert settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaSettings {
    /// Default chat the alert sink delivers to; runtime-overridable.
    pub default_chat_id: i64,
}

impl Default for CaptchaSettings {
    fn default() -> Self {
        Self {
            default_chat_id: -1_001_276_019_784,
        }
    }
}
