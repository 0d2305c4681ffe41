//! Runs one status transition or edit against the backend and reconciles
//! the cache with the outcome.
//!
//! At most one mutation per entity is in flight; a second request for the
//! same id is refused before anything is sent. Mutations on different
//! entities run independently.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mapfood_core::Resource;
use tracing::{debug, info, instrument, warn};

use crate::api::ApiError;
use crate::cancel::CancelToken;
use crate::error::MutationError;
use crate::listing::ResourceCache;
use crate::notify::{Notifier, Toast};

/// How the cache catches up after a successful mutation.
#[derive(Debug, Clone)]
pub enum Reconcile<R: Resource> {
    /// Overwrite exactly the fields that were sent.
    Patch(R::Patch),
    /// Re-run the current query; the change may move the entity between
    /// pages or filters.
    Refetch,
    /// The entity no longer belongs to the listing.
    Remove,
}

/// One mutation, described for the coordinator.
#[derive(Debug, Clone)]
pub struct Mutation<R: Resource> {
    pub id: R::Id,
    pub reconcile: Reconcile<R>,
    /// Toast on success.
    pub success: String,
    /// Toast prefix on failure; the error is appended.
    pub failure: String,
}

impl<R: Resource> Mutation<R> {
    #[must_use]
    pub fn new(id: R::Id, reconcile: Reconcile<R>) -> Self {
        Self {
            id,
            reconcile,
            success: format!("{} updated", capitalize(R::KIND)),
            failure: format!("Could not update {}", R::KIND),
        }
    }

    #[must_use]
    pub fn with_messages(mut self, success: impl Into<String>, failure: impl Into<String>) -> Self {
        self.success = success.into();
        self.failure = failure.into();
        self
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// What [`MutationCoordinator::execute`] did to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Patched,
    Removed,
    /// The caller must re-run its current query.
    RefetchRequired,
}

/// Serializes mutations per entity and applies their reconciliation.
pub struct MutationCoordinator<R: Resource> {
    cache: Arc<ResourceCache<R>>,
    notifier: Arc<dyn Notifier>,
    cancel: CancelToken,
    in_flight: Mutex<HashSet<R::Id>>,
}

impl<R: Resource> MutationCoordinator<R> {
    #[must_use]
    pub fn new(cache: Arc<ResourceCache<R>>, notifier: Arc<dyn Notifier>, cancel: CancelToken) -> Self {
        Self {
            cache,
            notifier,
            cancel,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Send `request` and reconcile the cache on success.
    ///
    /// Exactly one toast is emitted per call that reaches the backend,
    /// unless the owner was disposed meanwhile. On failure the cache is not
    /// touched.
    ///
    /// # Errors
    ///
    /// `InFlight` if another mutation on the same id has not finished,
    /// `Api` if the backend failed or rejected the request, `Cancelled` if
    /// the owner was disposed before the response arrived.
    #[instrument(skip_all, fields(kind = R::KIND, id = %mutation.id))]
    pub async fn execute<T, Fut>(
        &self,
        mutation: Mutation<R>,
        request: Fut,
    ) -> Result<MutationOutcome, MutationError>
    where
        Fut: Future<Output = Result<T, ApiError>> + Send,
    {
        let Some(claim) = self.claim(&mutation.id) else {
            debug!("Refusing concurrent mutation");
            return Err(MutationError::InFlight {
                kind: R::KIND,
                id: mutation.id.to_string(),
            });
        };

        let result = request.await;
        drop(claim);

        if self.cancel.is_cancelled() {
            debug!("Dropping mutation result for disposed controller");
            return Err(MutationError::Cancelled);
        }

        if let Err(source) = result {
            warn!(error = %source, "Mutation failed");
            self.notifier
                .notify(Toast::error(format!("{}: {source}", mutation.failure)));
            return Err(MutationError::Api {
                kind: R::KIND,
                id: mutation.id.to_string(),
                source,
            });
        }

        let outcome = match &mutation.reconcile {
            Reconcile::Patch(patch) => {
                if !self.cache.patch(&mutation.id, patch).await {
                    debug!("Entity left the cache before the patch landed");
                }
                MutationOutcome::Patched
            }
            Reconcile::Remove => {
                self.cache.remove(&mutation.id).await;
                MutationOutcome::Removed
            }
            Reconcile::Refetch => MutationOutcome::RefetchRequired,
        };

        info!(?outcome, "Mutation applied");
        self.notifier.notify(Toast::success(mutation.success));
        Ok(outcome)
    }

    /// Whether a mutation on `id` is currently in flight.
    #[must_use]
    pub fn is_in_flight(&self, id: &R::Id) -> bool {
        self.in_flight().contains(id)
    }

    fn in_flight(&self) -> MutexGuard<'_, HashSet<R::Id>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn claim(&self, id: &R::Id) -> Option<InFlight<'_, R>> {
        self.in_flight().insert(id.clone()).then(|| InFlight {
            coordinator: self,
            id: id.clone(),
        })
    }
}

/// Marks one id as in flight until dropped, so an abandoned request does
/// not block the entity for good.
struct InFlight<'a, R: Resource> {
    coordinator: &'a MutationCoordinator<R>,
    id: R::Id,
}

impl<R: Resource> Drop for InFlight<'_, R> {
    fn drop(&mut self) {
        self.coordinator.in_flight().remove(&self.id);
    }
}
