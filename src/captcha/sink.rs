//! Alert delivery seam.
//!
//! The monitor pushes captcha alerts through [`AlertSink`] so the
//! delivery backend stays swappable. The crate ships a logging sink;
//! a messaging integration plugs in behind the same trait.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from alert delivery.
#[derive(Debug, Error)]
pub enum AlertError {
    /// The backend rejected or failed the delivery.
    #[error("alert delivery failed: {0}")]
    Delivery(String),

    /// Reading the alert attachment failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Destination for captcha alerts.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver an image to the given chat.
    async fn send_photo(&self, chat_id: i64, path: &Path) -> Result<(), AlertError>;

    /// Deliver a text message to the given chat.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), AlertError>;
}

/// Sink that writes alerts to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn send_photo(&self, chat_id: i64, path: &Path) -> Result<(), AlertError> {
        tracing::info!(chat_id, path = %path.display(), "Captcha alert photo (log sink)");
        Ok(())
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), AlertError> {
        tracing::info!(chat_id, text, "Captcha alert message (log sink)");
        Ok(())
    }
}
