//! One listing: query state, fetch, cache and mutations wired together.

use std::future::Future;
use std::sync::Arc;

use mapfood_core::Resource;
use mapfood_core::query::{QuerySnapshot, QueryState};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::cache::ResourceCache;
use super::fetch::{FetchOrchestrator, FetchOutcome, ListingSource};
use crate::api::ApiError;
use crate::cancel::CancelToken;
use crate::error::{FetchError, MutationError};
use crate::mutation::{Mutation, MutationCoordinator, MutationOutcome};
use crate::notify::{Notifier, Toast};

/// Listing controller generic over the entity and where it comes from.
///
/// Query changes that alter nothing are no-ops and return
/// [`FetchOutcome::Skipped`] without touching the network. For sources with
/// [`ListingSource::LOCAL_QUERY`], search and filter changes never refetch;
/// [`ListingController::items`] applies them in memory instead.
pub struct ListingController<R: Resource, S: ListingSource<R>> {
    query: RwLock<QueryState>,
    cache: Arc<ResourceCache<R>>,
    fetcher: FetchOrchestrator<R, S>,
    mutations: MutationCoordinator<R>,
    notifier: Arc<dyn Notifier>,
    cancel: CancelToken,
}

impl<R: Resource, S: ListingSource<R>> ListingController<R, S> {
    #[must_use]
    pub fn new(source: S, query: QueryState, notifier: Arc<dyn Notifier>) -> Self {
        let cache = Arc::new(ResourceCache::new());
        let cancel = CancelToken::new();
        Self {
            query: RwLock::new(query),
            fetcher: FetchOrchestrator::new(source, cache.clone(), notifier.clone(), cancel.clone()),
            mutations: MutationCoordinator::new(cache.clone(), notifier.clone(), cancel.clone()),
            cache,
            notifier,
            cancel,
        }
    }

    /// Fetch the current query.
    ///
    /// # Errors
    ///
    /// See [`FetchOrchestrator::load`].
    pub async fn load(&self) -> Result<FetchOutcome, FetchError> {
        let snapshot = self.query.read().await.snapshot();
        self.fetch(snapshot).await
    }

    /// Same as [`ListingController::load`]; used after mutations that need
    /// the server's view.
    ///
    /// # Errors
    ///
    /// See [`FetchOrchestrator::load`].
    pub async fn refresh(&self) -> Result<FetchOutcome, FetchError> {
        self.load().await
    }

    /// Replace the search term and go back to page 1.
    ///
    /// # Errors
    ///
    /// See [`FetchOrchestrator::load`].
    pub async fn set_search(&self, term: &str) -> Result<FetchOutcome, FetchError> {
        self.change(S::LOCAL_QUERY, |query| query.set_search(term)).await
    }

    /// Set one filter and go back to page 1.
    ///
    /// # Errors
    ///
    /// See [`FetchOrchestrator::load`].
    pub async fn set_filter(&self, key: &str, value: &str) -> Result<FetchOutcome, FetchError> {
        self.change(S::LOCAL_QUERY, |query| query.set_filter(key, value)).await
    }

    /// Jump to `page`; out-of-range pages are ignored.
    ///
    /// # Errors
    ///
    /// See [`FetchOrchestrator::load`].
    pub async fn go_to_page(&self, page: u32) -> Result<FetchOutcome, FetchError> {
        self.change(false, |query| query.set_page(page)).await
    }

    /// # Errors
    ///
    /// See [`FetchOrchestrator::load`].
    pub async fn next_page(&self) -> Result<FetchOutcome, FetchError> {
        self.change(false, QueryState::next_page).await
    }

    /// # Errors
    ///
    /// See [`FetchOrchestrator::load`].
    pub async fn prev_page(&self) -> Result<FetchOutcome, FetchError> {
        self.change(false, QueryState::prev_page).await
    }

    /// Change the query without fetching; the next load picks it up.
    pub async fn stage(&self, update: impl FnOnce(&mut QueryState) + Send) {
        update(&mut *self.query.write().await);
    }

    async fn change(
        &self,
        local: bool,
        update: impl FnOnce(&mut QueryState) -> bool + Send,
    ) -> Result<FetchOutcome, FetchError> {
        // The snapshot is taken and the request issued without yielding in
        // between, so issue order matches query order.
        let snapshot = {
            let mut query = self.query.write().await;
            if !update(&mut query) {
                return Ok(FetchOutcome::Skipped);
            }
            query.snapshot()
        };

        if local {
            debug!(kind = R::KIND, "Query applied in memory");
            return Ok(FetchOutcome::Skipped);
        }
        self.fetch(snapshot).await
    }

    /// Fetch `snapshot`. When the server reports fewer pages than the one
    /// asked for, the page is pulled back and the new last page fetched, so
    /// the cached items always belong to the page the query points at.
    async fn fetch(&self, mut snapshot: QuerySnapshot) -> Result<FetchOutcome, FetchError> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let revision = snapshot.revision;
            let outcome = self.fetcher.load(snapshot).await?;
            let FetchOutcome::Applied { total_pages } = outcome else {
                return Ok(outcome);
            };

            let mut query = self.query.write().await;
            if query.revision() != revision || !query.set_total_pages(total_pages) {
                return Ok(outcome);
            }
            debug!(
                kind = R::KIND,
                page = query.page(),
                "Page past the end, fetching the last page"
            );
            snapshot = query.snapshot();
        }
    }

    /// Run a mutation through the coordinator, refetching when its
    /// reconciliation asks for it.
    ///
    /// # Errors
    ///
    /// See [`MutationCoordinator::execute`]. A failed follow-up refetch is
    /// reported through its own toast, not here.
    #[instrument(skip_all, fields(kind = R::KIND, id = %mutation.id))]
    pub async fn mutate<T, Fut>(
        &self,
        mutation: Mutation<R>,
        request: Fut,
    ) -> Result<MutationOutcome, MutationError>
    where
        Fut: Future<Output = Result<T, ApiError>> + Send,
    {
        let outcome = self.mutations.execute(mutation, request).await?;
        if outcome == MutationOutcome::RefetchRequired {
            if let Err(error) = self.refresh().await {
                debug!(%error, "Refetch after mutation did not apply");
            }
        }
        Ok(outcome)
    }

    /// Cached entity with `id`.
    ///
    /// # Errors
    ///
    /// `NotLoaded` when the entity is not on the current page.
    pub async fn entity(&self, id: &R::Id) -> Result<R, MutationError> {
        self.cache
            .get(id)
            .await
            .ok_or_else(|| MutationError::NotLoaded {
                kind: R::KIND,
                id: id.to_string(),
            })
    }

    /// Report a mutation refused before anything was sent.
    pub fn refuse(&self, error: impl Into<MutationError>) -> MutationError {
        let error = error.into();
        warn!(kind = R::KIND, %error, "Mutation refused");
        self.notifier.notify(Toast::error(error.to_string()));
        error
    }

    pub fn notify(&self, toast: Toast) {
        self.notifier.notify(toast);
    }

    /// Entities to render: the cached page, with search and filters applied
    /// in memory for local-query sources.
    pub async fn items(&self) -> Vec<R> {
        let items = self.cache.items().await;
        if !S::LOCAL_QUERY {
            return items;
        }
        let query = self.query.read().await.snapshot();
        items
            .into_iter()
            .filter(|item| S::matches(item, &query))
            .collect()
    }

    /// Copy of the current query.
    pub async fn query(&self) -> QueryState {
        self.query.read().await.clone()
    }

    pub async fn page(&self) -> u32 {
        self.query.read().await.page()
    }

    pub async fn total_pages(&self) -> u32 {
        self.query.read().await.total_pages()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.fetcher.is_loading()
    }

    pub async fn show_spinner(&self) -> bool {
        self.fetcher.show_spinner().await
    }

    pub const fn cache(&self) -> &Arc<ResourceCache<R>> {
        &self.cache
    }

    pub const fn source(&self) -> &S {
        self.fetcher.source()
    }

    /// Drop every response that is still in flight.
    pub fn dispose(&self) {
        debug!(kind = R::KIND, "Disposing listing");
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use mapfood_core::entity::Account;
    use mapfood_core::query::FILTER_ALL;

    use super::*;
    use crate::listing::Page;
    use crate::notify::MemoryNotifier;

    #[derive(Default)]
    struct StubSource {
        seen: Mutex<Vec<QuerySnapshot>>,
    }

    impl ListingSource<Account> for StubSource {
        async fn fetch(&self, query: &QuerySnapshot) -> Result<Page<Account>, ApiError> {
            self.seen.lock().unwrap().push(query.clone());
            let account: Account = serde_json::from_value(serde_json::json!({
                "_id": format!("a{}", query.page),
                "email": "x@example.com",
                "status": "ACTIVE"
            }))
            .unwrap();
            Ok(Page {
                items: vec![account],
                total_pages: 3,
            })
        }
    }

    fn controller() -> ListingController<Account, StubSource> {
        ListingController::new(
            StubSource::default(),
            QueryState::new().with_filter("status", FILTER_ALL),
            Arc::new(MemoryNotifier::new()),
        )
    }

    #[tokio::test]
    async fn test_load_records_total_pages() {
        let listing = controller();
        assert!(listing.load().await.unwrap().is_applied());
        assert_eq!(listing.total_pages().await, 3);
        assert!(!listing.is_loading());
    }

    #[tokio::test]
    async fn test_no_op_changes_skip_fetch() {
        let listing = controller();
        listing.load().await.unwrap();

        assert_eq!(listing.prev_page().await.unwrap(), FetchOutcome::Skipped);
        assert_eq!(
            listing.set_filter("status", FILTER_ALL).await.unwrap(),
            FetchOutcome::Skipped
        );
        assert_eq!(listing.source().seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_filter_after_paging_returns_to_first_page() {
        let listing = controller();
        listing.load().await.unwrap();
        listing.go_to_page(3).await.unwrap();
        assert_eq!(listing.page().await, 3);
        assert_eq!(listing.next_page().await.unwrap(), FetchOutcome::Skipped);

        listing.set_filter("status", "ACTIVE").await.unwrap();
        assert_eq!(listing.page().await, 1);
        let seen = listing.source().seen.lock().unwrap().clone();
        assert_eq!(seen.last().unwrap().page, 1);
        assert_eq!(seen.last().unwrap().filter("status"), Some("ACTIVE"));
    }

    #[tokio::test]
    async fn test_disposed_listing_does_not_fetch() {
        let listing = controller();
        listing.dispose();
        assert!(matches!(listing.load().await, Err(FetchError::Cancelled)));
        assert!(listing.source().seen.lock().unwrap().is_empty());
    }
}
