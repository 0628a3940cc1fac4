//! Clip download port

use std::path::PathBuf;

use async_trait::async_trait;

use super::player::ClipSource;
use super::room::RoomError;

/// Port for saving a clip's raw bytes where the user can find them
#[async_trait]
pub trait ClipDownloader: Send + Sync {
    /// Save `source` under `suggested_name` and return the final path.
    async fn save(&self, source: &ClipSource, suggested_name: &str) -> Result<PathBuf, RoomError>;
}
