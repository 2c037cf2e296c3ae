//! Game client operations.
//!
//! [`GameClient`] drives the Minecraft client through simulated input:
//! connecting, disconnecting, relaunching, keybind hits, and screenshots.
//! The recovery-facing subset is exposed through the [`GameActions`] trait
//! so the reconnect policy and the crash watcher can be tested against
//! mocks.

mod actions;
mod client;
mod error;
mod process;

pub use actions::GameActions;
pub use client::GameClient;
pub use error::ActionError;
pub use process::{kill_by_name, spawn_detached};
