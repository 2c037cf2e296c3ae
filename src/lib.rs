//! Craftwatch - watchdog that keeps a Minecraft client connected.

pub mod captcha;
pub mod config;
pub mod game;
pub mod reconnect;
pub mod watcher;
pub mod window;
