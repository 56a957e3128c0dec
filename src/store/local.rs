//! Key/value access to the local store.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::ClientError;
use crate::models::{
    Preferences, API_URL_KEY, AUTO_REFRESH_KEY, DARK_MODE_KEY, LANGUAGE_KEY, PAGE_SIZE_KEY,
    REFRESH_INTERVAL_KEY,
};

/// String values keyed by name. Multi-key writes are transactional.
#[derive(Debug, Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read a value.
    pub async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    /// Write a single value.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.set_many(&[(key, value)]).await
    }

    /// Write several values in one transaction: all land or none do.
    pub async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), ClientError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for (key, value) in entries {
            sqlx::query(
                "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(*key)
            .bind(*value)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Remove a value. Removing a missing key is not an error.
    pub async fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.remove_many(&[key]).await
    }

    /// Remove several values in one transaction.
    pub async fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError> {
        let mut tx = self.pool.begin().await?;
        for key in keys {
            sqlx::query("DELETE FROM kv WHERE key = ?")
                .bind(*key)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Load preferences, falling back to defaults for missing or unparsable keys.
    pub async fn load_preferences(&self) -> Result<Preferences, ClientError> {
        let defaults = Preferences::default();

        let api_url = self
            .get(API_URL_KEY)
            .await?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.api_url);
        let page_size = self
            .get(PAGE_SIZE_KEY)
            .await?
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.page_size);
        let language = self
            .get(LANGUAGE_KEY)
            .await?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.language);
        let dark_mode = self.get(DARK_MODE_KEY).await?.as_deref() == Some("true");
        let auto_refresh = self.get(AUTO_REFRESH_KEY).await?.as_deref() == Some("true");
        let refresh_interval = self
            .get(REFRESH_INTERVAL_KEY)
            .await?
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.refresh_interval);

        Ok(Preferences {
            api_url,
            page_size,
            language,
            dark_mode,
            auto_refresh,
            refresh_interval,
        })
    }

    /// Persist every preference key.
    pub async fn save_preferences(&self, prefs: &Preferences) -> Result<(), ClientError> {
        let page_size = prefs.page_size.to_string();
        let dark_mode = prefs.dark_mode.to_string();
        let auto_refresh = prefs.auto_refresh.to_string();
        let refresh_interval = prefs.refresh_interval.to_string();

        self.set_many(&[
            (API_URL_KEY, prefs.api_url.as_str()),
            (PAGE_SIZE_KEY, page_size.as_str()),
            (LANGUAGE_KEY, prefs.language.as_str()),
            (DARK_MODE_KEY, dark_mode.as_str()),
            (AUTO_REFRESH_KEY, auto_refresh.as_str()),
            (REFRESH_INTERVAL_KEY, refresh_interval.as_str()),
        ])
        .await
    }

    /// Close the pool. Further calls fail with a storage error.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::temp_store;
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let (store, _dir) = temp_store().await;

        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "one").await.unwrap();
        store.set("k", "two").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_preferences_defaults_and_save() {
        let (store, _dir) = temp_store().await;

        assert_eq!(store.load_preferences().await.unwrap(), Preferences::default());

        store.set(PAGE_SIZE_KEY, "not-a-number").await.unwrap();
        assert_eq!(store.load_preferences().await.unwrap().page_size, 20);

        let prefs = Preferences {
            api_url: "https://api.example".into(),
            page_size: 50,
            language: "ja".into(),
            dark_mode: true,
            auto_refresh: true,
            refresh_interval: 15,
        };
        store.save_preferences(&prefs).await.unwrap();
        assert_eq!(store.load_preferences().await.unwrap(), prefs);
    }
}
