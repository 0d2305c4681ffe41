//! Turns query snapshots into backend calls and commits the results.
//!
//! Requests are numbered as they are issued. When a response arrives, only
//! the one carrying the most recently issued number may touch the cache;
//! anything older is dropped on arrival, whether it succeeded or failed.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mapfood_core::Resource;
use mapfood_core::query::QuerySnapshot;
use tracing::{debug, instrument, warn};

use super::cache::{Page, ResourceCache};
use crate::api::ApiError;
use crate::cancel::CancelToken;
use crate::error::FetchError;
use crate::notify::{Notifier, Toast};

/// Where a listing gets its pages from.
pub trait ListingSource<R: Resource>: Send + Sync + 'static {
    /// `true` when [`ListingSource::fetch`] returns the whole collection and
    /// search and filters are applied in memory through
    /// [`ListingSource::matches`]. Changing them then never refetches.
    const LOCAL_QUERY: bool = false;

    /// Fetch the page described by `query`.
    fn fetch(&self, query: &QuerySnapshot)
    -> impl Future<Output = Result<Page<R>, ApiError>> + Send;

    /// In-memory search/filter predicate for local-query sources.
    fn matches(_item: &R, _query: &QuerySnapshot) -> bool {
        true
    }
}

/// Issue/settle bookkeeping for last-issued-wins requests.
#[derive(Debug, Default)]
pub struct Sequencer {
    issued: AtomicU64,
    settled: AtomicU64,
}

/// Number handed out when a request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Sequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number the next request.
    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Issue a ticket that settles when the returned guard is dropped.
    pub fn begin(&self) -> Settle<'_> {
        Settle {
            sequencer: self,
            ticket: self.issue(),
        }
    }

    /// Record that the request behind `ticket` has resolved.
    pub fn settle(&self, ticket: Ticket) {
        self.settled.fetch_max(ticket.0, Ordering::SeqCst);
    }

    /// Whether `ticket` is still the most recently issued request.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Whether the most recently issued request is still unresolved.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.settled.load(Ordering::SeqCst) < self.issued.load(Ordering::SeqCst)
    }
}

/// A ticket that settles itself when dropped, so an abandoned request does
/// not leave its owner loading.
#[derive(Debug)]
pub struct Settle<'a> {
    sequencer: &'a Sequencer,
    ticket: Ticket,
}

impl Settle<'_> {
    #[must_use]
    pub const fn ticket(&self) -> Ticket {
        self.ticket
    }
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        self.sequencer.settle(self.ticket);
    }
}

/// Result of a successful call to [`FetchOrchestrator::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was committed to the cache.
    Applied { total_pages: u32 },
    /// A newer request was issued meanwhile; the response was dropped.
    Superseded,
    /// Nothing needed fetching.
    Skipped,
}

impl FetchOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Loads pages from a [`ListingSource`] into a [`ResourceCache`].
pub struct FetchOrchestrator<R: Resource, S> {
    source: S,
    cache: Arc<ResourceCache<R>>,
    notifier: Arc<dyn Notifier>,
    cancel: CancelToken,
    sequencer: Sequencer,
}

impl<R: Resource, S: ListingSource<R>> FetchOrchestrator<R, S> {
    #[must_use]
    pub fn new(
        source: S,
        cache: Arc<ResourceCache<R>>,
        notifier: Arc<dyn Notifier>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            source,
            cache,
            notifier,
            cancel,
            sequencer: Sequencer::new(),
        }
    }

    /// Fetch `query` and commit the page if it is still the latest request.
    ///
    /// # Errors
    ///
    /// `FetchError::Api` when the latest request failed (the cache is left
    /// untouched and an error toast is emitted), `FetchError::Cancelled`
    /// when the owner was disposed while the request was in flight.
    #[instrument(skip_all, fields(kind = R::KIND, page = query.page, revision = query.revision))]
    pub async fn load(&self, query: QuerySnapshot) -> Result<FetchOutcome, FetchError> {
        let settle = self.sequencer.begin();
        let ticket = settle.ticket();
        debug!(?ticket, "Issuing fetch");

        let result = self.source.fetch(&query).await;
        drop(settle);

        if self.cancel.is_cancelled() {
            debug!(?ticket, "Dropping response for disposed controller");
            return Err(FetchError::Cancelled);
        }

        if !self.sequencer.is_current(ticket) {
            debug!(?ticket, "Discarding stale response");
            return Ok(FetchOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                let total_pages = page.total_pages.max(1);
                debug!(items = page.items.len(), total_pages, "Committing page");
                self.cache.replace(page).await;
                Ok(FetchOutcome::Applied { total_pages })
            }
            Err(source) => {
                warn!(error = %source, "Fetch failed");
                self.notifier
                    .notify(Toast::error(format!("Could not load {} list: {source}", R::KIND)));
                Err(FetchError::Api {
                    kind: R::KIND,
                    source,
                })
            }
        }
    }

    /// `true` from issuing a request until the latest one resolves.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.sequencer.is_loading()
    }

    /// Full-page spinner: only while loading with nothing to show.
    pub async fn show_spinner(&self) -> bool {
        self.is_loading() && self.cache.is_empty().await
    }

    pub const fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sequencer_last_issued_wins() {
        let seq = Sequencer::new();
        assert!(!seq.is_loading());

        let first = seq.issue();
        let second = seq.issue();
        assert!(seq.is_loading());
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));

        seq.settle(second);
        assert!(!seq.is_loading());

        // A late stale settle does not flip loading back on.
        seq.settle(first);
        assert!(!seq.is_loading());
    }

    #[test]
    fn test_dropped_guard_settles() {
        let seq = Sequencer::new();
        let settle = seq.begin();
        assert!(seq.is_current(settle.ticket()));
        assert!(seq.is_loading());
        drop(settle);
        assert!(!seq.is_loading());
    }

    #[test]
    fn test_loading_until_latest_settles() {
        let seq = Sequencer::new();
        let first = seq.issue();
        let second = seq.issue();
        seq.settle(first);
        assert!(seq.is_loading());
        seq.settle(second);
        assert!(!seq.is_loading());
    }
}
