//! Maccms source endpoints.

use super::client::segment;
use super::ApiClient;
use crate::errors::ClientResult;
use crate::models::{MaccmsConfig, MaccmsSetting};

impl ApiClient {
    /// GET /api/maccms - List all sources.
    pub async fn list_maccms(&self) -> ClientResult<Vec<MaccmsConfig>> {
        self.get("/api/maccms").await
    }

    /// GET /api/maccms/:id - Get a single source.
    pub async fn get_maccms(&self, id: &str) -> ClientResult<MaccmsConfig> {
        self.get(&format!("/api/maccms/{}", segment(id))).await
    }

    /// POST /api/maccms - Create a new source.
    pub async fn create_maccms(&self, request: &MaccmsSetting) -> ClientResult<MaccmsConfig> {
        self.post("/api/maccms", request).await
    }

    /// PUT /api/maccms/:id - Update a source.
    pub async fn update_maccms(
        &self,
        id: &str,
        request: &MaccmsSetting,
    ) -> ClientResult<MaccmsConfig> {
        self.put(&format!("/api/maccms/{}", segment(id)), request)
            .await
    }

    /// DELETE /api/maccms/:id - Delete a source.
    pub async fn delete_maccms(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/api/maccms/{}", segment(id))).await
    }

    /// POST /api/maccms/setting - Apply default values across all sources.
    pub async fn configure_maccms_setting(
        &self,
        setting: &MaccmsSetting,
    ) -> ClientResult<MaccmsSetting> {
        tracing::info!("Applying global Maccms setting");
        self.post("/api/maccms/setting", setting).await
    }
}
