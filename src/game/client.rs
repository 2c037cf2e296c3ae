//! Game client driver.
//!
//! Issues the concrete recovery operations through simulated input: every
//! UI action focuses the game window first (best-effort) and paces its
//! keystrokes/clicks to cover client animation and load latency.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::config::{ButtonsConfig, ConfigError, InputSettings, ProcessSettings, WatchConfig};
use crate::window::{Key, Platform, PlatformError, Point, WindowController};

use super::actions::GameActions;
use super::error::ActionError;
use super::process::{kill_by_name, spawn_detached};

/// Drives the Minecraft client and its launcher.
///
/// One instance per process, constructed at startup and shared by handle
/// with every component that needs it.
#[derive(Clone)]
pub struct GameClient {
    platform: Arc<dyn Platform>,
    game_window: WindowController,
    launcher_window: WindowController,
    buttons: ButtonsConfig,
    input: InputSettings,
    process: ProcessSettings,
    launcher_exe: PathBuf,
}

impl GameClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] when a window title pattern
    /// does not compile.
    pub fn new(platform: Arc<dyn Platform>, config: &WatchConfig) -> Result<Self, ConfigError> {
        let game_pattern = compile_pattern(&config.window.game_title_pattern)?;
        let launcher_pattern = compile_pattern(&config.window.launcher_title_pattern)?;

        let game_window = WindowController::with_retry(
            platform.clone(),
            game_pattern,
            config.window.focus_attempts,
            config.window.focus_retry_wait(),
        );
        let launcher_window = WindowController::with_retry(
            platform.clone(),
            launcher_pattern,
            config.window.focus_attempts,
            config.window.focus_retry_wait(),
        );

        Ok(Self {
            platform,
            game_window,
            launcher_window,
            buttons: config.input.buttons.clone(),
            input: config.input.clone(),
            process: config.process.clone(),
            launcher_exe: config.paths.launcher_exe.clone(),
        })
    }

    /// Rejoin the target server from the in-game menus.
    ///
    /// # Errors
    ///
    /// Fails when simulated input cannot be delivered.
    pub async fn connect(&self) -> Result<(), ActionError> {
        self.focus_game().await;
        self.click(self.buttons.back_to_server_list).await?;
        self.join_from_server_list().await
    }

    /// Leave the current server via the pause menu.
    ///
    /// # Errors
    ///
    /// Fails when simulated input cannot be delivered.
    pub async fn disconnect(&self) -> Result<(), ActionError> {
        tracing::info!("Disconnecting from server");
        self.hit_key(Key::Escape).await?;
        self.click(self.buttons.disconnect).await
    }

    /// Disconnect, then connect.
    ///
    /// # Errors
    ///
    /// Fails when either half fails.
    pub async fn reconnect(&self) -> Result<(), ActionError> {
        self.disconnect().await?;
        self.connect().await
    }

    /// Kill the client and launcher, restart the launcher, and drive the
    /// client back into the target server.
    ///
    /// Blocks for the configured load budgets so dependent actions never
    /// race ahead of the client's actual state.
    ///
    /// # Errors
    ///
    /// Fails when the launcher cannot be started or input cannot be
    /// delivered.
    pub async fn relaunch(&self) -> Result<(), ActionError> {
        tracing::info!("Relaunching game client");
        kill_by_name(&self.process.launcher_process);
        kill_by_name(&self.process.game_process);

        spawn_detached(&self.launcher_exe).map_err(ActionError::Launch)?;
        tokio::time::sleep(self.process.launcher_load()).await;
        if let Err(e) = self.launcher_window.focus().await {
            tracing::warn!(error = %e, "Could not focus launcher window, proceeding anyway");
        }

        self.click(self.buttons.play).await?;
        tokio::time::sleep(self.process.game_load()).await;
        self.focus_game().await;
        self.join_from_server_list().await
    }

    /// Press Escape in game (pause menu toggle).
    ///
    /// # Errors
    ///
    /// Fails when the keystroke cannot be delivered.
    pub async fn press_escape(&self) -> Result<(), ActionError> {
        tracing::info!("Pressing ESC in game");
        self.hit_key(Key::Escape).await
    }

    /// Send a chat message in game.
    ///
    /// # Errors
    ///
    /// Fails when a keystroke cannot be delivered.
    pub async fn send_chat_message(&self, message: &str) -> Result<(), ActionError> {
        tracing::info!(message, "Sending chat message");
        self.hit_key(Key::Char(self.input.chat_key)).await?;
        self.platform.type_text(message)?;
        self.hit_key(Key::Enter).await
    }

    /// Hit the macro mod's refresh keybind.
    ///
    /// # Errors
    ///
    /// Fails when the keystroke cannot be delivered.
    pub async fn refresh(&self) -> Result<(), ActionError> {
        tracing::info!("Refreshing macro");
        self.hit_key(Key::Char(self.input.refresh_key)).await
    }

    /// Hit the macro mod's reset-stats keybind.
    ///
    /// # Errors
    ///
    /// Fails when the keystroke cannot be delivered.
    pub async fn reset_stats(&self) -> Result<(), ActionError> {
        tracing::info!("Resetting macro stats");
        self.hit_key(Key::Char(self.input.reset_stats_key)).await
    }

    /// Hit the macro mod's reload-config keybind.
    ///
    /// # Errors
    ///
    /// Fails when the keystroke cannot be delivered.
    pub async fn update_macro_config(&self) -> Result<(), ActionError> {
        tracing::info!("Updating macro config");
        self.hit_key(Key::Char(self.input.config_key)).await
    }

    /// Capture the game window's client area to `path`.
    ///
    /// # Errors
    ///
    /// Fails when the window cannot be focused or the capture written.
    pub async fn save_live_image(&self, path: &Path) -> Result<(), ActionError> {
        tracing::info!(path = %path.display(), "Taking screenshot of game window");
        self.game_window.save_screenshot(path).await?;
        Ok(())
    }

    /// Focus the game window, logging instead of failing.
    ///
    /// Actions proceed degraded on focus failure; the input may still land
    /// if the window holds focus from a previous action.
    async fn focus_game(&self) {
        if let Err(e) = self.game_window.focus().await {
            tracing::warn!(error = %e, "Could not focus game window, proceeding anyway");
        }
    }

    /// Focus best-effort, then press and release a single key with the
    /// configured settle delay.
    async fn hit_key(&self, key: Key) -> Result<(), ActionError> {
        self.focus_game().await;
        self.platform.press_key(key)?;
        tokio::time::sleep(self.input.key_delay()).await;
        Ok(())
    }

    /// Left-click a screen position. The cursor-settle waits inside the
    /// OS click sequence block, so it runs on the blocking pool.
    async fn click(&self, (x, y): (i32, i32)) -> Result<(), ActionError> {
        let platform = self.platform.clone();
        tokio::task::spawn_blocking(move || platform.click(Point { x, y }))
            .await
            .map_err(|e| PlatformError::Api(format!("input task failed: {e}")))??;
        Ok(())
    }

    /// The multiplayer, server entry, join click sequence.
    async fn join_from_server_list(&self) -> Result<(), ActionError> {
        tracing::info!("Connecting to target server");
        self.click(self.buttons.multiplayer).await?;
        self.click(self.buttons.server).await?;
        self.click(self.buttons.join_server).await
    }
}

#[async_trait]
impl GameActions for GameClient {
    async fn connect(&self) -> Result<(), ActionError> {
        GameClient::connect(self).await
    }

    async fn relaunch(&self) -> Result<(), ActionError> {
        GameClient::relaunch(self).await
    }

    async fn save_live_image(&self, path: &Path) -> Result<(), ActionError> {
        GameClient::save_live_image(self, path).await
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })
}
