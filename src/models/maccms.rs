//! Maccms collector configuration models.

use serde::{Deserialize, Serialize};

/// Creation and modification timestamps as stored by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MaccmsMeta {
    #[serde(default)]
    pub create_at: String,
    #[serde(default)]
    pub update_at: String,
}

/// One configured content source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaccmsConfig {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(rename = "geturl", default)]
    pub fetch_url: String,
    #[serde(rename = "delcategory", default)]
    pub delete_category: String,
    #[serde(rename = "open", default)]
    pub active: bool,
    #[serde(rename = "ism3u8", default)]
    pub is_m3u8: bool,
    #[serde(rename = "date", default)]
    pub schedule_date: i64,
    #[serde(rename = "cron", default)]
    pub cron_interval: i64,
    #[serde(rename = "cjnum", default)]
    pub item_quota: i64,
    #[serde(default)]
    pub meta: MaccmsMeta,
}

impl MaccmsConfig {
    pub fn created_at(&self) -> &str {
        &self.meta.create_at
    }

    pub fn updated_at(&self) -> &str {
        &self.meta.update_at
    }
}

/// Editable fields of a source. Also the body of the global setting call,
/// which applies these values as defaults across every source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaccmsSetting {
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(rename = "geturl")]
    pub fetch_url: String,
    #[serde(rename = "delcategory")]
    pub delete_category: String,
    #[serde(rename = "open")]
    pub active: bool,
    #[serde(rename = "ism3u8")]
    pub is_m3u8: bool,
    #[serde(rename = "date")]
    pub schedule_date: i64,
    #[serde(rename = "cron")]
    pub cron_interval: i64,
    #[serde(rename = "cjnum")]
    pub item_quota: i64,
}

impl Default for MaccmsSetting {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            fetch_url: String::new(),
            delete_category: String::new(),
            active: true,
            is_m3u8: false,
            schedule_date: 0,
            cron_interval: 0,
            item_quota: 10,
        }
    }
}

impl From<&MaccmsConfig> for MaccmsSetting {
    fn from(config: &MaccmsConfig) -> Self {
        Self {
            source_url: config.source_url.clone(),
            fetch_url: config.fetch_url.clone(),
            delete_category: config.delete_category.clone(),
            active: config.active,
            is_m3u8: config.is_m3u8,
            schedule_date: config.schedule_date,
            cron_interval: config.cron_interval,
            item_quota: config.item_quota,
        }
    }
}
