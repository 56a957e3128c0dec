//! Media detail view: one record, its episodes, and lazy episode expansion.
//!
//! Methods take `&self` so several expansions can be awaited at once; state sits
//! behind a mutex that is never held across an await.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::generation::Generation;
use super::notice::Notices;
use crate::api::ApiClient;
use crate::errors::{ClientError, ClientResult};
use crate::hydrator::{merge_assets, needs_fetch, EpisodeHydrator, EpisodeSource, Expansion};
use crate::models::{Episode, EpisodeRequest, Media};
use crate::validation::EpisodeForm;

/// Remote operations the detail view needs.
#[async_trait]
pub trait MediaRecordSource: EpisodeSource {
    async fn fetch_media(&self, media_id: &str) -> ClientResult<Media>;
    async fn add_episode(&self, media_id: &str, request: &EpisodeRequest) -> ClientResult<Media>;
    async fn update_episode(
        &self,
        media_id: &str,
        episode_id: &str,
        request: &EpisodeRequest,
    ) -> ClientResult<Media>;
    async fn delete_episode(&self, media_id: &str, episode_id: &str) -> ClientResult<Media>;
}

#[async_trait]
impl MediaRecordSource for ApiClient {
    async fn fetch_media(&self, media_id: &str) -> ClientResult<Media> {
        self.get_media(media_id).await
    }

    async fn add_episode(&self, media_id: &str, request: &EpisodeRequest) -> ClientResult<Media> {
        ApiClient::add_episode(self, media_id, request).await
    }

    async fn update_episode(
        &self,
        media_id: &str,
        episode_id: &str,
        request: &EpisodeRequest,
    ) -> ClientResult<Media> {
        ApiClient::update_episode(self, media_id, episode_id, request).await
    }

    async fn delete_episode(&self, media_id: &str, episode_id: &str) -> ClientResult<Media> {
        ApiClient::delete_episode(self, media_id, episode_id).await
    }
}

/// What the view currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Loaded(Media),
    NotFound,
    /// Fetch failed for another reason; the last-known record, if any, is kept.
    Failed(Option<Media>),
}

impl DetailState {
    pub fn media(&self) -> Option<&Media> {
        match self {
            DetailState::Loaded(media) | DetailState::Failed(Some(media)) => Some(media),
            _ => None,
        }
    }

    fn media_mut(&mut self) -> Option<&mut Media> {
        match self {
            DetailState::Loaded(media) | DetailState::Failed(Some(media)) => Some(media),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: DetailState,
    pending_delete: Option<String>,
    notices: Notices,
}

/// Result of an expansion as seen by the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    Expanded(Expansion),
    /// The view was torn down before the assets arrived.
    Discarded,
}

#[derive(Debug)]
pub struct MediaDetailView<S: MediaRecordSource> {
    media_id: String,
    source: Arc<S>,
    hydrator: EpisodeHydrator<S>,
    inner: Mutex<Inner>,
    generation: Generation,
    mounted: u64,
}

impl<S: MediaRecordSource> MediaDetailView<S> {
    pub fn new(media_id: &str, source: Arc<S>) -> Self {
        let generation = Generation::default();
        let mounted = generation.ticket();
        Self {
            media_id: media_id.to_string(),
            hydrator: EpisodeHydrator::new(Arc::clone(&source)),
            source,
            inner: Mutex::new(Inner {
                state: DetailState::Loading,
                pending_delete: None,
                notices: Notices::default(),
            }),
            generation,
            mounted,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every write is a single assignment, so a poisoned guard still holds
        // a whole state.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn media_id(&self) -> &str {
        &self.media_id
    }

    pub fn state(&self) -> DetailState {
        self.lock().state.clone()
    }

    pub fn media(&self) -> Option<Media> {
        self.lock().state.media().cloned()
    }

    pub fn episodes(&self) -> Vec<Episode> {
        self.media().map(|m| m.episodes).unwrap_or_default()
    }

    pub fn pending_delete(&self) -> Option<String> {
        self.lock().pending_delete.clone()
    }

    pub fn take_notices(&self) -> Vec<super::Notice> {
        self.lock().notices.drain()
    }

    pub fn generation(&self) -> Generation {
        self.generation.clone()
    }

    pub fn teardown(&self) {
        self.generation.teardown();
    }

    pub fn is_live(&self) -> bool {
        self.generation.is_current(self.mounted)
    }

    /// Fetch the record. A 404 moves the view to `NotFound`; other failures keep
    /// whatever was shown before.
    pub async fn load(&self) -> ClientResult<()> {
        if !self.is_live() {
            return Ok(());
        }

        let result = self.source.fetch_media(&self.media_id).await;
        if !self.is_live() {
            tracing::debug!("Dropping media {} for a torn-down view", self.media_id);
            return Ok(());
        }

        let mut inner = self.lock();
        match result {
            Ok(media) => {
                inner.state = DetailState::Loaded(media);
                Ok(())
            }
            Err(ClientError::NotFound(msg)) => {
                inner.state = DetailState::NotFound;
                Err(ClientError::NotFound(msg))
            }
            Err(e) => {
                let previous = inner.state.media().cloned();
                inner.state = DetailState::Failed(previous);
                inner.notices.error("Failed to fetch media details");
                Err(e)
            }
        }
    }

    /// Expand one episode, fetching its assets the first time.
    pub async fn expand(&self, episode_id: &str) -> ClientResult<ExpandOutcome> {
        {
            let inner = self.lock();
            let media = inner.state.media().ok_or_else(|| {
                ClientError::NotFound(format!("Media {} is not loaded", self.media_id))
            })?;
            if !needs_fetch(&media.episodes, episode_id)? {
                return Ok(ExpandOutcome::Expanded(Expansion::AlreadyHydrated));
            }
        }

        let result = self.hydrator.fetch(&self.media_id, episode_id).await;
        if !self.is_live() {
            return Ok(ExpandOutcome::Discarded);
        }

        let mut inner = self.lock();
        match result {
            Ok(assets) => {
                if let Some(media) = inner.state.media_mut() {
                    merge_assets(&mut media.episodes, episode_id, assets);
                }
                Ok(ExpandOutcome::Expanded(Expansion::Hydrated))
            }
            Err(e) => {
                inner
                    .notices
                    .error(format!("Failed to load episode: {}", e.user_message()));
                Err(e)
            }
        }
    }

    async fn write_then_reload<F>(&self, success: &str, write: F) -> ClientResult<()>
    where
        F: std::future::Future<Output = ClientResult<Media>>,
    {
        match write.await {
            Ok(_) => {
                self.lock().notices.success(success);
                // Other reload failures are already shown as notices.
                match self.load().await {
                    Err(e) if e.is_auth() => Err(e),
                    _ => Ok(()),
                }
            }
            Err(e) => {
                self.lock().notices.error(e.user_message());
                Err(e)
            }
        }
    }

    /// Edit form for one episode, prefilled with its assets. A summary episode
    /// is expanded first.
    pub async fn episode_form(&self, episode_id: &str) -> ClientResult<EpisodeForm> {
        if self.expand(episode_id).await? == ExpandOutcome::Discarded {
            return Err(ClientError::Validation(
                "Media view was closed before the episode loaded".to_string(),
            ));
        }
        let media = self.media().ok_or_else(|| {
            ClientError::NotFound(format!("Media {} is not loaded", self.media_id))
        })?;
        let episode = media
            .episode(episode_id)
            .ok_or_else(|| ClientError::NotFound(format!("Episode {} not found", episode_id)))?;
        EpisodeForm::try_from(episode)
    }

    pub async fn add_episode(&self, form: &EpisodeForm) -> ClientResult<()> {
        let request = form.validate()?;
        self.write_then_reload(
            "Episode added successfully",
            self.source.add_episode(&self.media_id, &request),
        )
        .await
    }

    pub async fn update_episode(&self, episode_id: &str, form: &EpisodeForm) -> ClientResult<()> {
        let request = form.validate()?;
        self.write_then_reload(
            "Episode updated successfully",
            self.source
                .update_episode(&self.media_id, episode_id, &request),
        )
        .await
    }

    pub fn request_delete(&self, episode_id: &str) {
        self.lock().pending_delete = Some(episode_id.to_string());
    }

    pub fn cancel_delete(&self) {
        self.lock().pending_delete = None;
    }

    /// Delete the requested episode, then reload. No-op without a request.
    pub async fn confirm_delete(&self) -> ClientResult<bool> {
        let Some(episode_id) = self.lock().pending_delete.take() else {
            return Ok(false);
        };
        self.write_then_reload(
            "Episode deleted successfully",
            self.source.delete_episode(&self.media_id, &episode_id),
        )
        .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrator::test_support::CountingSource;
    use crate::models::{EpisodeAssets, MediaStatus, MediaType};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn media() -> Media {
        Media {
            id: "m1".into(),
            media_type: MediaType::ANIME,
            translations: BTreeMap::new(),
            title: "Kaiju".into(),
            release_date: None,
            year: 2021,
            episode_count: 2,
            duration: 24,
            status: MediaStatus::Approved,
            ongoing: false,
            tags: vec![],
            episodes: vec![
                Episode::summary("e1", "S01E01"),
                Episode::summary("e2", "S01E02"),
            ],
            view_count: 0,
            rating: 0.0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[derive(Debug, Default)]
    struct Backend {
        assets: CountingSource,
        media_fetches: AtomicUsize,
        deletes: Mutex<Vec<String>>,
        missing: bool,
    }

    #[async_trait]
    impl EpisodeSource for Backend {
        async fn fetch_episode(&self, media_id: &str, episode_id: &str) -> ClientResult<EpisodeAssets> {
            self.assets.fetch_episode(media_id, episode_id).await
        }
    }

    #[async_trait]
    impl MediaRecordSource for Backend {
        async fn fetch_media(&self, _media_id: &str) -> ClientResult<Media> {
            self.media_fetches.fetch_add(1, Ordering::SeqCst);
            if self.missing {
                return Err(ClientError::NotFound("Media not found".into()));
            }
            Ok(media())
        }

        async fn add_episode(&self, _media_id: &str, _request: &EpisodeRequest) -> ClientResult<Media> {
            Ok(media())
        }

        async fn update_episode(
            &self,
            _media_id: &str,
            _episode_id: &str,
            _request: &EpisodeRequest,
        ) -> ClientResult<Media> {
            Ok(media())
        }

        async fn delete_episode(&self, _media_id: &str, episode_id: &str) -> ClientResult<Media> {
            self.deletes.lock().unwrap().push(episode_id.to_string());
            Ok(media())
        }
    }

    #[tokio::test]
    async fn test_expand_merges_and_leaves_sibling() {
        let backend = Arc::new(Backend::default());
        let view = MediaDetailView::new("m1", Arc::clone(&backend));
        view.load().await.unwrap();
        let sibling_before = view.episodes()[1].clone();

        let outcome = view.expand("e1").await.unwrap();

        assert_eq!(outcome, ExpandOutcome::Expanded(Expansion::Hydrated));
        let episodes = view.episodes();
        assert_eq!(
            episodes[0],
            Episode::Detail {
                id: "e1".into(),
                label: "S01E01".into(),
                video: Some("/v/e1.mp4".into()),
                screenshots: vec!["/s/1.jpg".into()],
            }
        );
        assert_eq!(episodes[1], sibling_before);

        // Second expansion is served from the merged record.
        assert_eq!(
            view.expand("e1").await.unwrap(),
            ExpandOutcome::Expanded(Expansion::AlreadyHydrated)
        );
        assert_eq!(backend.assets.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_expansions_fetch_once() {
        let backend = Arc::new(Backend {
            assets: CountingSource::with_delay(50),
            ..Default::default()
        });
        let view = MediaDetailView::new("m1", Arc::clone(&backend));
        view.load().await.unwrap();

        let (a, b) = tokio::join!(view.expand("e2"), view.expand("e2"));

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(backend.assets.calls(), 1);
        assert!(view.episodes()[1].is_detail());
    }

    #[tokio::test]
    async fn test_teardown_discards_expansion() {
        let backend = Arc::new(Backend {
            assets: CountingSource::with_delay(50),
            ..Default::default()
        });
        let view = MediaDetailView::new("m1", Arc::clone(&backend));
        view.load().await.unwrap();
        let handle = view.generation();

        let (outcome, _) = tokio::join!(view.expand("e1"), async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            handle.teardown();
        });

        assert_eq!(outcome.unwrap(), ExpandOutcome::Discarded);
        assert!(!view.episodes()[0].is_detail());
    }

    #[tokio::test]
    async fn test_not_found_state() {
        let backend = Arc::new(Backend {
            missing: true,
            ..Default::default()
        });
        let view = MediaDetailView::new("m404", backend);

        assert!(matches!(view.load().await, Err(ClientError::NotFound(_))));
        assert_eq!(view.state(), DetailState::NotFound);
    }

    #[tokio::test]
    async fn test_episode_delete_requires_confirmation() {
        let backend = Arc::new(Backend::default());
        let view = MediaDetailView::new("m1", Arc::clone(&backend));
        view.load().await.unwrap();

        view.request_delete("e2");
        view.cancel_delete();
        assert!(!view.confirm_delete().await.unwrap());
        assert!(backend.deletes.lock().unwrap().is_empty());

        view.request_delete("e2");
        assert!(view.confirm_delete().await.unwrap());
        assert_eq!(*backend.deletes.lock().unwrap(), vec!["e2".to_string()]);
        assert_eq!(backend.media_fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_episode_form_is_not_sent() {
        let backend = Arc::new(Backend::default());
        let view = MediaDetailView::new("m1", Arc::clone(&backend));
        view.load().await.unwrap();

        let err = view.add_episode(&EpisodeForm::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(backend.media_fetches.load(Ordering::SeqCst), 1);
        assert!(view.take_notices().is_empty());
    }
}
