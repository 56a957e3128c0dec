//! Media and episode endpoints.

use serde::Deserialize;

use super::client::segment;
use super::ApiClient;
use crate::errors::{ClientError, ClientResult};
use crate::models::{
    Episode, EpisodeAssets, EpisodeRequest, Media, MediaFilter, MediaRequest, Page,
    PaginatedResponse,
};

/// Body of the episode detail call. Depending on the backend version it is the
/// episode itself or the whole parent record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EpisodeDetailResponse {
    Media(Box<Media>),
    Episode(Episode),
}

impl EpisodeDetailResponse {
    /// Assets of `episode_id`. A summary-shaped answer means the episode has none.
    pub fn into_assets(self, episode_id: &str) -> ClientResult<EpisodeAssets> {
        let episode = match self {
            EpisodeDetailResponse::Episode(episode) => episode,
            EpisodeDetailResponse::Media(media) => media
                .episodes
                .into_iter()
                .find(|e| e.id() == episode_id)
                .ok_or_else(|| {
                    ClientError::NotFound(format!("Episode {} not found", episode_id))
                })?,
        };
        Ok(episode.assets().unwrap_or_default())
    }
}

impl ApiClient {
    /// GET /api/media - List one page of media matching `filter`.
    pub async fn list_media(&self, filter: &MediaFilter, page: u32) -> ClientResult<Page<Media>> {
        let response: PaginatedResponse<Media> = self
            .get_with_query("/api/media", &filter.query_pairs(page))
            .await?;
        Ok(response.into())
    }

    /// GET /api/media/:id - Get a single media entry.
    pub async fn get_media(&self, id: &str) -> ClientResult<Media> {
        self.get(&format!("/api/media/{}", segment(id))).await
    }

    /// POST /api/media - Create a media entry.
    pub async fn create_media(&self, request: &MediaRequest) -> ClientResult<Media> {
        self.post("/api/media", request).await
    }

    /// PUT /api/media/:id - Update a media entry.
    pub async fn update_media(&self, id: &str, request: &MediaRequest) -> ClientResult<Media> {
        self.put(&format!("/api/media/{}", segment(id)), request).await
    }

    /// DELETE /api/media/:id - Delete a media entry.
    pub async fn delete_media(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/api/media/{}", segment(id))).await
    }

    /// POST /api/media/:id/episodes - Add an episode.
    pub async fn add_episode(&self, media_id: &str, request: &EpisodeRequest) -> ClientResult<Media> {
        self.post(&format!("/api/media/{}/episodes", segment(media_id)), request)
            .await
    }

    /// PUT /api/media/:id/episodes/:episode_id - Update an episode.
    pub async fn update_episode(
        &self,
        media_id: &str,
        episode_id: &str,
        request: &EpisodeRequest,
    ) -> ClientResult<Media> {
        self.put(
            &format!(
                "/api/media/{}/episodes/{}",
                segment(media_id),
                segment(episode_id)
            ),
            request,
        )
        .await
    }

    /// DELETE /api/media/:id/episodes/:episode_id - Delete an episode.
    pub async fn delete_episode(&self, media_id: &str, episode_id: &str) -> ClientResult<Media> {
        self.delete_returning(&format!(
            "/api/media/{}/episodes/{}",
            segment(media_id),
            segment(episode_id)
        ))
        .await
    }

    /// GET /api/media/:id/:episode_id - Fetch one episode's video and screenshots.
    pub async fn get_episode_assets(
        &self,
        media_id: &str,
        episode_id: &str,
    ) -> ClientResult<EpisodeAssets> {
        let response: EpisodeDetailResponse = self
            .get(&format!(
                "/api/media/{}/{}",
                segment(media_id),
                segment(episode_id)
            ))
            .await?;
        response.into_assets(episode_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_response_as_episode() {
        let response: EpisodeDetailResponse = serde_json::from_value(json!({
            "_id": "e1", "episode": "S01E01", "video": "/v/e1.mp4", "screenshots": ["/s/1.jpg"]
        }))
        .unwrap();
        let assets = response.into_assets("e1").unwrap();
        assert_eq!(assets.video.as_deref(), Some("/v/e1.mp4"));
        assert_eq!(assets.screenshots, vec!["/s/1.jpg".to_string()]);
    }

    #[test]
    fn test_detail_response_as_parent_media() {
        let response: EpisodeDetailResponse = serde_json::from_value(json!({
            "_id": "m1",
            "mediaType": "ANIME",
            "originalTitle": "Kaiju",
            "status": "approved",
            "episodesList": [
                {"_id": "e1", "episode": "1"},
                {"_id": "e2", "episode": "2", "video": "/v/e2.mp4", "screenshots": []}
            ]
        }))
        .unwrap();
        assert!(matches!(response, EpisodeDetailResponse::Media(_)));

        let assets = response.clone().into_assets("e2").unwrap();
        assert_eq!(assets.video.as_deref(), Some("/v/e2.mp4"));
        assert!(matches!(
            response.into_assets("e9"),
            Err(ClientError::NotFound(_))
        ));
    }
}
