//! Incremental episode hydration.
//!
//! Episode lists arrive in summary shape. The video and screenshots of an episode
//! are fetched the first time it is expanded and merged back into the list in
//! place. At most one fetch per (media, episode) pair is in flight; later
//! expansions of the same pair await the pending one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};

use crate::api::ApiClient;
use crate::errors::{ClientError, ClientResult};
use crate::models::{Episode, EpisodeAssets};

/// Where episode assets come from.
#[async_trait]
pub trait EpisodeSource: Send + Sync + 'static {
    async fn fetch_episode(&self, media_id: &str, episode_id: &str) -> ClientResult<EpisodeAssets>;
}

#[async_trait]
impl EpisodeSource for ApiClient {
    async fn fetch_episode(&self, media_id: &str, episode_id: &str) -> ClientResult<EpisodeAssets> {
        self.get_episode_assets(media_id, episode_id).await
    }
}

/// What an expansion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Assets were fetched and merged.
    Hydrated,
    /// The episode already had its assets; nothing was fetched.
    AlreadyHydrated,
}

type PendingFetch = Shared<BoxFuture<'static, ClientResult<EpisodeAssets>>>;

struct InFlight {
    ticket: u64,
    fetch: PendingFetch,
}

type Key = (String, String);

pub struct EpisodeHydrator<S: EpisodeSource> {
    source: Arc<S>,
    in_flight: Mutex<HashMap<Key, InFlight>>,
    next_ticket: AtomicU64,
}

impl<S: EpisodeSource> std::fmt::Debug for EpisodeHydrator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpisodeHydrator")
            .field("in_flight", &self.in_flight_count())
            .finish()
    }
}

impl<S: EpisodeSource> EpisodeHydrator<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            in_flight: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Number of fetches currently pending.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Fetch the assets of one episode, joining a pending fetch for the same
    /// pair when there is one. The pair's entry is dropped once the fetch
    /// settles, so a failed fetch is retried on the next call.
    pub async fn fetch(&self, media_id: &str, episode_id: &str) -> ClientResult<EpisodeAssets> {
        let key: Key = (media_id.to_string(), episode_id.to_string());

        let (ticket, fetch) = {
            let mut in_flight = self
                .in_flight
                .lock()
                .map_err(|_| ClientError::Storage("Hydration state poisoned".to_string()))?;

            match in_flight.get(&key) {
                Some(pending) => {
                    tracing::debug!("Joining pending fetch for episode {}/{}", media_id, episode_id);
                    (pending.ticket, pending.fetch.clone())
                }
                None => {
                    let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                    let source = Arc::clone(&self.source);
                    let (m, e) = key.clone();
                    let fetch = async move { source.fetch_episode(&m, &e).await }
                        .boxed()
                        .shared();
                    in_flight.insert(
                        key.clone(),
                        InFlight {
                            ticket,
                            fetch: fetch.clone(),
                        },
                    );
                    tracing::debug!("Fetching episode {}/{}", media_id, episode_id);
                    (ticket, fetch)
                }
            }
        };

        let result = fetch.await;

        if let Ok(mut in_flight) = self.in_flight.lock() {
            if in_flight.get(&key).is_some_and(|p| p.ticket == ticket) {
                in_flight.remove(&key);
            }
        }

        if let Err(e) = &result {
            tracing::warn!("Episode {}/{} fetch failed: {}", media_id, episode_id, e);
        }
        result
    }

    /// Expand `episode_id` inside an owned episode list.
    ///
    /// A detail-shaped episode is left alone without a fetch. On failure the
    /// list is untouched.
    pub async fn expand(
        &self,
        episodes: &mut [Episode],
        media_id: &str,
        episode_id: &str,
    ) -> ClientResult<Expansion> {
        if !needs_fetch(episodes, episode_id)? {
            return Ok(Expansion::AlreadyHydrated);
        }

        let assets = self.fetch(media_id, episode_id).await?;
        merge_assets(episodes, episode_id, assets);
        Ok(Expansion::Hydrated)
    }
}

/// Whether `episode_id` is still summary-shaped and needs its assets fetched.
pub fn needs_fetch(episodes: &[Episode], episode_id: &str) -> ClientResult<bool> {
    match episodes.iter().find(|e| e.id() == episode_id) {
        None => Err(ClientError::NotFound(format!(
            "Episode {} not found",
            episode_id
        ))),
        Some(Episode::Detail { .. }) => Ok(false),
        Some(Episode::Summary { .. }) => Ok(true),
    }
}

/// Replace the episode with id `episode_id` by its detail shape. Every other
/// element keeps its position and value. Returns whether a match was found.
pub fn merge_assets(episodes: &mut [Episode], episode_id: &str, assets: EpisodeAssets) -> bool {
    match episodes.iter_mut().find(|e| e.id() == episode_id) {
        Some(slot) => {
            *slot = slot.with_assets(assets);
            true
        }
        None => false,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Episode source that counts calls and answers after a delay.
    #[derive(Debug, Default)]
    pub struct CountingSource {
        pub calls: AtomicUsize,
        pub fail_first: std::sync::atomic::AtomicBool,
        pub delay_ms: u64,
    }

    impl CountingSource {
        pub fn with_delay(delay_ms: u64) -> Self {
            Self {
                delay_ms,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EpisodeSource for CountingSource {
        async fn fetch_episode(&self, _media_id: &str, episode_id: &str) -> ClientResult<EpisodeAssets> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail_first.swap(false, Ordering::SeqCst) {
                return Err(ClientError::Network("connection reset".to_string()));
            }
            Ok(EpisodeAssets {
                video: Some(format!("/v/{}.mp4", episode_id)),
                screenshots: vec!["/s/1.jpg".to_string()],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::CountingSource;
    use super::*;
    use std::sync::atomic::Ordering;

    fn episodes() -> Vec<Episode> {
        vec![
            Episode::summary("e1", "S01E01"),
            Episode::summary("e2", "S01E02"),
            Episode::summary("e3", "S01E03"),
        ]
    }

    #[tokio::test]
    async fn test_expand_replaces_only_target() {
        let source = Arc::new(CountingSource::default());
        let hydrator = EpisodeHydrator::new(Arc::clone(&source));
        let before = episodes();
        let mut list = before.clone();

        let outcome = hydrator.expand(&mut list, "m1", "e1").await.unwrap();

        assert_eq!(outcome, Expansion::Hydrated);
        assert_eq!(
            list[0],
            Episode::Detail {
                id: "e1".into(),
                label: "S01E01".into(),
                video: Some("/v/e1.mp4".into()),
                screenshots: vec!["/s/1.jpg".into()],
            }
        );
        assert_eq!(list[1..], before[1..]);
    }

    #[tokio::test]
    async fn test_detail_episode_needs_no_fetch() {
        let source = Arc::new(CountingSource::default());
        let hydrator = EpisodeHydrator::new(Arc::clone(&source));
        let mut list = vec![Episode::Detail {
            id: "e1".into(),
            label: "S01E01".into(),
            video: None,
            screenshots: vec![],
        }];

        let outcome = hydrator.expand(&mut list, "m1", "e1").await.unwrap();

        assert_eq!(outcome, Expansion::AlreadyHydrated);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_request() {
        let source = Arc::new(CountingSource::with_delay(50));
        let hydrator = EpisodeHydrator::new(Arc::clone(&source));

        let (a, b) = tokio::join!(hydrator.fetch("m1", "e1"), hydrator.fetch("m1", "e1"));

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(source.calls(), 1);
        assert_eq!(hydrator.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_distinct_pairs_fetch_separately() {
        let source = Arc::new(CountingSource::with_delay(10));
        let hydrator = EpisodeHydrator::new(Arc::clone(&source));

        let (a, b) = tokio::join!(hydrator.fetch("m1", "e1"), hydrator.fetch("m1", "e2"));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_leaves_summary_and_allows_retry() {
        let source = Arc::new(CountingSource::default());
        source.fail_first.store(true, Ordering::SeqCst);
        let hydrator = EpisodeHydrator::new(Arc::clone(&source));
        let mut list = episodes();

        let err = hydrator.expand(&mut list, "m1", "e2").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(list, episodes());

        let outcome = hydrator.expand(&mut list, "m1", "e2").await.unwrap();
        assert_eq!(outcome, Expansion::Hydrated);
        assert!(list[1].is_detail());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_episode() {
        let hydrator = EpisodeHydrator::new(Arc::new(CountingSource::default()));
        let mut list = episodes();
        assert!(matches!(
            hydrator.expand(&mut list, "m1", "e9").await,
            Err(ClientError::NotFound(_))
        ));
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut list = episodes();
        assert!(merge_assets(&mut list, "e3", EpisodeAssets::default()));
        assert_eq!(
            list.iter().map(Episode::id).collect::<Vec<_>>(),
            vec!["e1", "e2", "e3"]
        );
        assert!(!merge_assets(&mut list, "e9", EpisodeAssets::default()));
    }
}
