use async_trait::async_trait;
use url::Url;

use super::types::{Quality, Room};
use crate::external::PlatformError;

/// Capability set every streaming platform resolver exposes.
#[async_trait]
pub trait LivePlatformProvider: Send + Sync {
    /// Stable registry key, e.g. `bili`.
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn icon_url(&self) -> Url;

    /// Looks up a room by canonical id or alias.
    async fn get_room(&self, room_id: &str) -> Result<Room, PlatformError>;

    /// Qualities the room offers, most preferred first.
    async fn get_qualities(&self, room_id: &str) -> Result<Vec<Quality>, PlatformError>;

    /// Playable URLs for one quality, least reliable hosts last.
    async fn get_live_urls(
        &self,
        room_id: &str,
        quality_id: &str,
    ) -> Result<Vec<Url>, PlatformError>;
}
