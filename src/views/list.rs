//! Generic list/filter/paginate view model.
//!
//! A list view shows one page of a resource. Every successful write is followed
//! by a refetch of the current page instead of a local patch, so the view never
//! drifts from what the backend holds. Deleting goes through an explicit
//! request/confirm step before any call is made.

use std::future::Future;

use async_trait::async_trait;

use super::generation::Generation;
use super::notice::Notices;
use crate::errors::{ClientError, ClientResult};
use crate::models::Page;

/// A remote collection that can be listed a page at a time and deleted from.
#[async_trait]
pub trait ListSource: Clone + Send + Sync + 'static {
    type Item: Clone + Send + Sync;
    type Filter: Clone + Default + PartialEq + Send + Sync;

    /// Singular display name used in notices ("User", "Media").
    const NOUN: &'static str;

    async fn fetch_page(
        &self,
        filter: &Self::Filter,
        page: u32,
        limit: u32,
    ) -> ClientResult<Page<Self::Item>>;

    async fn delete_item(&self, id: &str) -> ClientResult<()>;

    fn item_id(item: &Self::Item) -> &str;
}

/// Whether a load landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// The view was torn down while the request was pending.
    Discarded,
}

#[derive(Debug)]
pub struct ListView<S: ListSource> {
    source: S,
    items: Vec<S::Item>,
    loading: bool,
    page: u32,
    total: u64,
    total_pages: u32,
    limit: u32,
    filter: S::Filter,
    pending_delete: Option<String>,
    notices: Notices,
    generation: Generation,
    mounted: u64,
}

impl<S: ListSource> ListView<S> {
    pub fn new(source: S, limit: u32) -> Self {
        let generation = Generation::default();
        let mounted = generation.ticket();
        Self {
            source,
            items: Vec::new(),
            loading: false,
            page: 1,
            total: 0,
            total_pages: 1,
            limit: limit.max(1),
            filter: S::Filter::default(),
            pending_delete: None,
            notices: Notices::default(),
            generation,
            mounted,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn items(&self) -> &[S::Item] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn filter(&self) -> &S::Filter {
        &self.filter
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    pub fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }

    /// Handle that tears this view down from elsewhere.
    pub fn generation(&self) -> Generation {
        self.generation.clone()
    }

    pub fn teardown(&self) {
        self.generation.teardown();
    }

    /// False once the view has been torn down.
    pub fn is_live(&self) -> bool {
        self.generation.is_current(self.mounted)
    }

    /// Fetch the current page. On failure the last-known items stay in place and
    /// an error notice is raised; the error is still returned so the caller can
    /// react to an expired session.
    pub async fn load(&mut self) -> ClientResult<LoadOutcome> {
        if !self.is_live() {
            return Ok(LoadOutcome::Discarded);
        }
        self.loading = true;

        let result = self
            .source
            .fetch_page(&self.filter, self.page, self.limit)
            .await;

        if !self.is_live() {
            tracing::debug!("Dropping {} page {} for a torn-down view", S::NOUN, self.page);
            return Ok(LoadOutcome::Discarded);
        }
        self.loading = false;

        match result {
            Ok(page) => {
                tracing::debug!(
                    "Loaded {} {} items (page {}/{})",
                    page.items.len(),
                    S::NOUN,
                    self.page,
                    page.total_pages
                );
                self.items = page.items;
                self.total = page.total;
                self.total_pages = page.total_pages.max(1);
                Ok(LoadOutcome::Applied)
            }
            Err(e) => {
                self.notices
                    .error(format!("Failed to fetch {}: {}", S::NOUN.to_lowercase(), e.user_message()));
                Err(e)
            }
        }
    }

    /// Replace the filter. Always goes back to the first page.
    pub async fn set_filter(&mut self, filter: S::Filter) -> ClientResult<LoadOutcome> {
        self.filter = filter;
        self.page = 1;
        self.load().await
    }

    pub async fn set_page(&mut self, page: u32) -> ClientResult<LoadOutcome> {
        self.page = page.max(1);
        self.load().await
    }

    /// Run a write, report it, then refetch the current page.
    pub async fn mutate<T, F>(&mut self, success: &str, write: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        match write.await {
            Ok(value) => {
                self.notices.success(success);
                // A rejected credential on the refetch must still reach the
                // caller; other refetch failures are already shown as notices.
                match self.load().await {
                    Err(e) if e.is_auth() => Err(e),
                    _ => Ok(value),
                }
            }
            Err(e) => {
                if !matches!(e, ClientError::Validation(_)) {
                    self.notices.error(e.user_message());
                }
                Err(e)
            }
        }
    }

    /// First phase of a delete: remember what to delete. No call is made.
    pub fn request_delete(&mut self, id: &str) {
        self.pending_delete = Some(id.to_string());
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Second phase: delete the requested item and refetch. Without a pending
    /// request nothing happens.
    pub async fn confirm_delete(&mut self) -> ClientResult<bool> {
        let Some(id) = self.pending_delete.take() else {
            return Ok(false);
        };

        let source = self.source.clone();
        let message = format!("{} deleted successfully", S::NOUN);
        self.mutate(&message, async move { source.delete_item(&id).await })
            .await?;
        Ok(true)
    }

    pub fn find(&self, id: &str) -> Option<&S::Item> {
        self.items.iter().find(|item| S::item_id(item) == id)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory source recording every call.
    #[derive(Debug, Clone, Default)]
    pub struct MemorySource {
        pub rows: Arc<Mutex<Vec<(String, String)>>>,
        pub calls: Arc<Mutex<Vec<String>>>,
        /// Returned by every page fetch while set.
        pub fetch_error: Arc<Mutex<Option<ClientError>>>,
    }

    impl MemorySource {
        pub fn with_rows(n: usize, kind: &str) -> Self {
            let rows = (1..=n)
                .map(|i| (format!("id{}", i), kind.to_string()))
                .collect();
            Self {
                rows: Arc::new(Mutex::new(rows)),
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ListSource for MemorySource {
        type Item = (String, String);
        type Filter = Option<String>;

        const NOUN: &'static str = "Row";

        async fn fetch_page(
            &self,
            filter: &Self::Filter,
            page: u32,
            limit: u32,
        ) -> ClientResult<Page<Self::Item>> {
            self.calls.lock().unwrap().push(format!("GET page={}", page));
            if let Some(e) = self.fetch_error.lock().unwrap().clone() {
                return Err(e);
            }
            let rows: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, kind)| filter.as_ref().map_or(true, |f| f == kind))
                .cloned()
                .collect();
            Ok(Page::slice(rows, page, limit))
        }

        async fn delete_item(&self, id: &str) -> ClientResult<()> {
            self.calls.lock().unwrap().push(format!("DELETE {}", id));
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|(row_id, _)| row_id != id);
            if rows.len() == before {
                return Err(ClientError::NotFound(format!("{} not found", id)));
            }
            Ok(())
        }

        fn item_id(item: &Self::Item) -> &str {
            &item.0
        }
    }
}
