use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::external::json::CookieProvider;
use crate::store::Store;

pub const SETTING_STORE_NAME: &str = "settings";
const BILI_COOKIE_KEY: &str = "bili_cookie";

/// Key/value user settings persisted in the `settings` store.
#[derive(Clone)]
pub struct SettingService {
    store: Arc<dyn Store<HashMap<String, String>>>,
    write_lock: Arc<Mutex<()>>,
}

impl SettingService {
    pub fn new(store: Arc<dyn Store<HashMap<String, String>>>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Stored bilibili cookie, empty when unset or unreadable.
    pub async fn get_bili_cookie(&self) -> String {
        match self.store.read().await {
            Ok(mut settings) => settings.remove(BILI_COOKIE_KEY).unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Failed to read bili cookie");
                String::new()
            }
        }
    }

    /// Stores the cookie and echoes it back, or returns an empty string when
    /// it could not be saved.
    pub async fn set_bili_cookie(&self, cookie: String) -> String {
        let _guard = self.write_lock.lock().await;
        let mut settings = match self.store.read().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Failed to read bili cookie");
                return String::new();
            }
        };
        settings.insert(BILI_COOKIE_KEY.to_string(), cookie.clone());
        if let Err(e) = self.store.write(&settings).await {
            warn!(error = %e, "Failed to write bili cookie");
            return String::new();
        }
        info!(cookie_len = cookie.len(), "Bili cookie updated");
        cookie
    }
}

#[async_trait]
impl CookieProvider for SettingService {
    async fn cookie(&self) -> Option<String> {
        Some(self.get_bili_cookie().await).filter(|c| !c.is_empty())
    }
}
