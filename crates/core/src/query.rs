//! Search, filter and page state of one listing.
//!
//! `QueryState` is a plain value owned by a listing controller. Changing the
//! search term or any filter sends the listing back to page 1; changing the
//! page alone leaves everything else untouched. Every accepted change bumps a
//! revision so callers can tell whether a new fetch is due.

use std::collections::BTreeMap;

/// Filter value meaning "no filtering"; never sent to the backend.
pub const FILTER_ALL: &str = "all";

/// Current query of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    search: String,
    filters: BTreeMap<String, String>,
    page: u32,
    total_pages: u32,
    revision: u64,
}

/// Immutable copy of the query handed to the fetch layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySnapshot {
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub page: u32,
    pub revision: u64,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryState {
    /// Empty search, no filters, page 1 of 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            page: 1,
            total_pages: 1,
            revision: 0,
        }
    }

    /// Declare a filter with its default value (usually [`FILTER_ALL`]).
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        self.total_pages
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the search term. Returns whether anything changed.
    pub fn set_search(&mut self, term: impl Into<String>) -> bool {
        let term = term.into();
        if term == self.search {
            return false;
        }
        self.search = term;
        self.reset_page();
        true
    }

    /// Set a filter value. Returns whether anything changed.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let value = value.into();
        if self.filters.get(&key) == Some(&value) {
            return false;
        }
        self.filters.insert(key, value);
        self.reset_page();
        true
    }

    /// Move to `page` if it lies within `[1, total_pages]`.
    ///
    /// Out-of-range requests and requests for the current page are no-ops.
    pub fn set_page(&mut self, page: u32) -> bool {
        if page < 1 || page > self.total_pages || page == self.page {
            return false;
        }
        self.page = page;
        self.revision += 1;
        true
    }

    /// Next page, or no-op on the last page.
    pub fn next_page(&mut self) -> bool {
        self.set_page(self.page.saturating_add(1))
    }

    /// Previous page, or no-op on the first page.
    pub fn prev_page(&mut self) -> bool {
        self.set_page(self.page.saturating_sub(1))
    }

    /// Record the page count reported by the server.
    ///
    /// A missing or zero count is treated as a single page, and the current
    /// page is pulled back inside the new bound. Returns `true` when the page
    /// moved; the page on screen is then stale and must be fetched again.
    pub fn set_total_pages(&mut self, total_pages: u32) -> bool {
        self.total_pages = total_pages.max(1);
        if self.page <= self.total_pages {
            return false;
        }
        self.page = self.total_pages;
        self.revision += 1;
        true
    }

    /// Whether the current query is unfiltered and unsearched.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.search.trim().is_empty() && self.filters.values().all(|v| v == FILTER_ALL)
    }

    /// Copy of the state to hand to the fetch layer.
    #[must_use]
    pub fn snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            search: self.search.clone(),
            filters: self.filters.clone(),
            page: self.page,
            revision: self.revision,
        }
    }

    fn reset_page(&mut self) {
        self.page = 1;
        self.revision += 1;
    }
}

impl QuerySnapshot {
    /// Outgoing request parameters.
    ///
    /// `page` is always present; `search` only when non-blank; each filter
    /// only when it differs from [`FILTER_ALL`] and is non-empty.
    #[must_use]
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("page".to_owned(), self.page.to_string())];
        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search".to_owned(), search.to_owned()));
        }
        params.extend(
            self.filters
                .iter()
                .filter(|(_, v)| !v.is_empty() && v.as_str() != FILTER_ALL)
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        params
    }

    #[must_use]
    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty() && *v != FILTER_ALL)
    }

    /// Trimmed search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        Some(self.search.trim()).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shops_query() -> QueryState {
        QueryState::new().with_filter("status", FILTER_ALL)
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut q = shops_query();
        assert!(q.set_search("pho"));
        q.set_total_pages(3);
        assert!(q.set_page(3));
        assert_eq!(q.page(), 3);

        assert!(q.set_filter("status", "ACTIVE"));
        assert_eq!(q.page(), 1);
        assert_eq!(q.search(), "pho");
    }

    #[test]
    fn test_search_change_resets_page() {
        let mut q = shops_query();
        q.set_total_pages(5);
        q.set_page(4);
        assert!(q.set_search("bun"));
        assert_eq!(q.page(), 1);
    }

    #[test]
    fn test_same_value_is_not_a_change() {
        let mut q = shops_query();
        q.set_total_pages(2);
        q.set_page(2);
        let rev = q.revision();
        assert!(!q.set_filter("status", FILTER_ALL));
        assert!(!q.set_search(""));
        assert_eq!(q.page(), 2);
        assert_eq!(q.revision(), rev);
    }

    #[test]
    fn test_page_bounds_are_no_ops() {
        let mut q = shops_query();
        q.set_total_pages(2);
        assert!(!q.prev_page());
        assert_eq!(q.page(), 1);
        assert!(q.next_page());
        assert_eq!(q.page(), 2);
        assert!(!q.next_page());
        assert_eq!(q.page(), 2);
        assert!(!q.set_page(0));
        assert!(!q.set_page(3));
    }

    #[test]
    fn test_page_change_keeps_filters() {
        let mut q = shops_query();
        q.set_filter("status", "INACTIVE");
        q.set_search("com");
        q.set_total_pages(4);
        q.set_page(2);
        assert_eq!(q.filter("status"), Some("INACTIVE"));
        assert_eq!(q.search(), "com");
    }

    #[test]
    fn test_shrinking_total_pulls_page_back() {
        let mut q = shops_query();
        q.set_total_pages(5);
        q.set_page(5);
        let rev = q.revision();
        assert!(q.set_total_pages(2));
        assert_eq!(q.page(), 2);
        assert!(q.revision() > rev);
        assert!(q.set_total_pages(0));
        assert_eq!(q.total_pages(), 1);
        assert_eq!(q.page(), 1);
    }

    #[test]
    fn test_growing_total_keeps_page() {
        let mut q = shops_query();
        q.set_total_pages(2);
        q.set_page(2);
        let rev = q.revision();
        assert!(!q.set_total_pages(4));
        assert_eq!(q.page(), 2);
        assert_eq!(q.revision(), rev);
    }

    #[test]
    fn test_params_omit_defaults() {
        let mut q = QueryState::new()
            .with_filter("role", FILTER_ALL)
            .with_filter("status", FILTER_ALL);
        assert_eq!(q.snapshot().params(), vec![("page".to_owned(), "1".to_owned())]);

        q.set_search("  lan ");
        q.set_filter("status", "PENDING");
        let params = q.snapshot().params();
        assert_eq!(
            params,
            vec![
                ("page".to_owned(), "1".to_owned()),
                ("search".to_owned(), "lan".to_owned()),
                ("status".to_owned(), "PENDING".to_owned()),
            ]
        );
    }
}
