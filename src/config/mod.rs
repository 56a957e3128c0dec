//! Configuration module for the admin console.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the REST backend
    pub api_url: String,
    /// Path to the SQLite file holding the session and preferences
    pub data_path: PathBuf,
    /// Timeout applied to every backend request
    pub request_timeout: Duration,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_url =
            env::var("ADMIN_API_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());

        let data_path = env::var("ADMIN_DATA_PATH")
            .unwrap_or_else(|_| "./data/admin.sqlite".to_string())
            .into();

        let request_timeout = env::var("ADMIN_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let log_level = env::var("ADMIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            api_url,
            data_path,
            request_timeout,
            log_level,
        }
    }
}
