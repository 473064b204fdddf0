use anyhow::Result;
use async_trait::async_trait;

use super::models::ResolvedSong;

/// Receives every song the queue completes.
///
/// Called once per completed item, outside the queue lock. An error here is
/// logged and never reverts the item's status.
#[async_trait]
pub trait LibrarySink: Send + Sync {
    async fn add_song(&self, song: ResolvedSong) -> Result<()>;
}
