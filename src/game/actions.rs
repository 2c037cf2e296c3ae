//! Recovery action seam.

use std::path::Path;

use async_trait::async_trait;

use super::error::ActionError;

/// The recovery operations the watchers drive.
///
/// Implemented by [`GameClient`](super::GameClient); tests substitute
/// mocks to observe which actions a policy run invoked.
#[async_trait]
pub trait GameActions: Send + Sync {
    /// Rejoin the target server from the in-game menus.
    async fn connect(&self) -> Result<(), ActionError>;

    /// Kill and fully restart the client, then rejoin the server.
    async fn relaunch(&self) -> Result<(), ActionError>;

    /// Capture the live game window to `path`.
    async fn save_live_image(&self, path: &Path) -> Result<(), ActionError>;
}
