//! Last successfully fetched page of a listing.
//!
//! Only two writers exist: the fetch orchestrator replaces the whole page,
//! and the mutation coordinator patches or removes single entries. Readers
//! always get a copy of the latest committed state.

use std::collections::HashSet;

use mapfood_core::Resource;
use tokio::sync::RwLock;
use tracing::warn;

/// One page of entities as returned by a listing source.
#[derive(Debug, Clone)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub total_pages: u32,
}

impl<R> Page<R> {
    /// A single page holding everything.
    #[must_use]
    pub const fn single(items: Vec<R>) -> Self {
        Self {
            items,
            total_pages: 1,
        }
    }
}

struct CacheState<R> {
    items: Vec<R>,
    total_pages: u32,
    loaded: bool,
}

/// Entities of the current page, keyed by id.
pub struct ResourceCache<R: Resource> {
    state: RwLock<CacheState<R>>,
}

impl<R: Resource> Default for ResourceCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> ResourceCache<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CacheState {
                items: Vec::new(),
                total_pages: 1,
                loaded: false,
            }),
        }
    }

    /// Replace the whole page.
    ///
    /// Ids are unique in the cache; a repeated id keeps its first entry.
    pub async fn replace(&self, page: Page<R>) {
        let mut seen = HashSet::with_capacity(page.items.len());
        let items: Vec<R> = page
            .items
            .into_iter()
            .filter(|item| {
                let fresh = seen.insert(item.id().clone());
                if !fresh {
                    warn!(kind = R::KIND, id = %item.id(), "Dropping duplicate entry from page");
                }
                fresh
            })
            .collect();

        let mut state = self.state.write().await;
        state.items = items;
        state.total_pages = page.total_pages.max(1);
        state.loaded = true;
    }

    /// Overwrite the fields carried by `patch` on the entry with `id`.
    ///
    /// Returns `false` when no such entry is cached.
    pub async fn patch(&self, id: &R::Id, patch: &R::Patch) -> bool {
        let mut state = self.state.write().await;
        match state.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                item.apply_patch(patch);
                true
            }
            None => false,
        }
    }

    /// Drop the entry with `id`.
    pub async fn remove(&self, id: &R::Id) -> Option<R> {
        let mut state = self.state.write().await;
        let index = state.items.iter().position(|item| item.id() == id)?;
        Some(state.items.remove(index))
    }

    /// Copy of the entry with `id`.
    pub async fn get(&self, id: &R::Id) -> Option<R> {
        let state = self.state.read().await;
        state.items.iter().find(|item| item.id() == id).cloned()
    }

    /// Copy of every cached entry, in server order.
    pub async fn items(&self) -> Vec<R> {
        self.state.read().await.items.clone()
    }

    /// Page count reported with the cached page.
    pub async fn total_pages(&self) -> u32 {
        self.state.read().await.total_pages
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.items.is_empty()
    }

    /// Whether any fetch has completed yet.
    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.loaded
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mapfood_core::entity::{Account, AccountPatch};
    use mapfood_core::{AccountId, AccountStatus};

    use super::*;

    fn account(id: &str, name: &str, status: &str) -> Account {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "email": format!("{id}@example.com"),
            "status": status,
            "email_verified": true,
            "user": {"full_name": name, "phone": "0901234567"}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_patch_touches_only_sent_fields() {
        let cache = ResourceCache::new();
        cache
            .replace(Page::single(vec![account("a1", "Lan", "ACTIVE")]))
            .await;
        let before = cache.get(&AccountId::new("a1")).await.unwrap();

        let patched = cache
            .patch(&AccountId::new("a1"), &AccountPatch::status(AccountStatus::Pending))
            .await;
        assert!(patched);

        let after = cache.get(&AccountId::new("a1")).await.unwrap();
        assert_eq!(after.status, AccountStatus::Pending);
        assert_eq!(after.email, before.email);
        assert_eq!(after.user, before.user);
        assert_eq!(after.email_verified, before.email_verified);
    }

    #[tokio::test]
    async fn test_patch_unknown_id() {
        let cache: ResourceCache<Account> = ResourceCache::new();
        assert!(
            !cache
                .patch(&AccountId::new("nope"), &AccountPatch::default())
                .await
        );
    }

    #[tokio::test]
    async fn test_replace_keeps_ids_unique() {
        let cache = ResourceCache::new();
        cache
            .replace(Page {
                items: vec![
                    account("a1", "Lan", "ACTIVE"),
                    account("a2", "Minh", "ACTIVE"),
                    account("a1", "Lan (dup)", "PENDING"),
                ],
                total_pages: 0,
            })
            .await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.total_pages().await, 1);
        let first = cache.get(&AccountId::new("a1")).await.unwrap();
        assert_eq!(first.full_name(), Some("Lan"));
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = ResourceCache::new();
        assert!(!cache.is_loaded().await);
        cache
            .replace(Page::single(vec![account("a1", "Lan", "ACTIVE")]))
            .await;
        assert!(cache.is_loaded().await);
        assert!(cache.remove(&AccountId::new("a1")).await.is_some());
        assert!(cache.is_empty().await);
        assert!(cache.remove(&AccountId::new("a1")).await.is_none());
    }
}
