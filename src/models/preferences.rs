//! Operator preferences kept in the local store.

use serde::{Deserialize, Serialize};

pub const API_URL_KEY: &str = "apiUrl";
pub const PAGE_SIZE_KEY: &str = "screenshotsPerPage";
pub const LANGUAGE_KEY: &str = "defaultLanguage";
pub const DARK_MODE_KEY: &str = "darkMode";
pub const AUTO_REFRESH_KEY: &str = "autoRefresh";
pub const REFRESH_INTERVAL_KEY: &str = "refreshInterval";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub api_url: String,
    #[serde(rename = "screenshotsPerPage")]
    pub page_size: u32,
    #[serde(rename = "defaultLanguage")]
    pub language: String,
    pub dark_mode: bool,
    pub auto_refresh: bool,
    /// Seconds between automatic refreshes
    pub refresh_interval: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001".to_string(),
            page_size: 20,
            language: "en".to_string(),
            dark_mode: false,
            auto_refresh: false,
            refresh_interval: 60,
        }
    }
}
