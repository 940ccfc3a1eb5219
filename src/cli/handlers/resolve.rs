//! Resolve command handler
//!
//! Runs the resolution facade once and prints the result as JSON, without
//! the API server or the proxy.

use serde_json::{Value, json};

use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::services::Services;

/// Handler for the resolve command
pub struct ResolveCommandHandler {
    services: Services,
}

impl ResolveCommandHandler {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Builds the services from configuration.
    ///
    /// Nothing is routed through the proxy since it is never started here.
    pub async fn from_settings(settings: &Settings) -> AppResult<Self> {
        let mut settings = settings.clone();
        settings.proxy.rewrite_assets = false;
        settings.proxy.rewrite_live_urls = false;
        Ok(Self::new(Services::from_settings(&settings).await?))
    }

    /// The room with its qualities, or the stream URLs of `quality` when one
    /// is given.
    pub async fn resolve(
        &self,
        platform: &str,
        room_id: &str,
        quality: Option<&str>,
    ) -> AppResult<Value> {
        let platforms = &self.services.platforms;
        if platforms.get_platform(platform).is_none() {
            return Err(AppError::not_found("Platform", "id", platform));
        }

        let room = platforms
            .get_room(platform, room_id)
            .await
            .ok_or_else(|| AppError::not_found("Room", "id", room_id))?;

        if let Some(quality) = quality {
            let urls = platforms
                .get_live_urls(platform, &room.id, quality)
                .await
                .ok_or_else(|| AppError::not_found("Quality", "id", quality))?;
            return Ok(json!({ "room": room, "urls": urls }));
        }

        let qualities = platforms
            .get_qualities(platform, &room.id)
            .await
            .unwrap_or_default();
        Ok(json!({ "room": room, "qualities": qualities }))
    }

    /// Resolve and print pretty JSON to stdout.
    pub async fn execute(
        &self,
        platform: &str,
        room_id: &str,
        quality: Option<&str>,
    ) -> AppResult<()> {
        let value = self.resolve(platform, room_id, quality).await?;
        let text = serde_json::to_string_pretty(&value).map_err(|e| AppError::Internal {
            source: e.into(),
        })?;
        println!("{text}");
        Ok(())
    }
}
