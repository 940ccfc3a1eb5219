//! Transport representations handed out by the services.
//!
//! URL fields are absolute strings. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::external::live::{LivePlatformProvider, Quality};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformView {
    pub id: String,
    pub name: String,
    pub icon_url: String,
}

impl PlatformView {
    pub fn of(provider: &dyn LivePlatformProvider) -> Self {
        Self {
            id: provider.id().to_string(),
            name: provider.name().to_string(),
            icon_url: provider.icon_url().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerView {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    /// Canonical room id
    pub id: String,
    pub title: String,
    pub owner: OwnerView,
    pub is_online: bool,
    pub cover_url: String,
    pub platform: PlatformView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualityView {
    pub id: String,
    pub name: String,
    /// 0 for the most preferred quality, lower is less preferred
    pub priority: i8,
}

impl From<Quality> for QualityView {
    fn from(q: Quality) -> Self {
        Self {
            id: q.id,
            name: q.name,
            priority: q.priority,
        }
    }
}

/// A saved layout of rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    #[validate(length(min = 1, message = "id must not be empty"))]
    pub id: String,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(nested)]
    pub rooms: Vec<BoardRoomView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardRoomView {
    #[validate(length(min = 1, message = "room id must not be empty"))]
    pub id: String,
    #[validate(length(min = 1, message = "platform id must not be empty"))]
    pub platform_id: String,
    #[serde(default)]
    pub avatar_url: String,
}
