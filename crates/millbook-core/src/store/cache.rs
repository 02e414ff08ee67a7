// ── Shared list-query cache ──
//
// One cache per scope, keyed by resource family + encoded query. Each
// family carries a version counter on a `watch` channel; bumping it
// drops the family's entries and wakes every list controller watching it.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use crate::model::{PaginationMeta, Row};
use crate::query::{ListQuery, encode};

/// One cached page.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPage {
    pub rows: Arc<Vec<Row>>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    family: String,
    query: BTreeMap<String, String>,
}

impl CacheKey {
    fn new(family: &str, query: &ListQuery) -> Self {
        Self {
            family: family.to_owned(),
            query: encode(query),
        }
    }
}

/// Query cache shared by all list controllers of a scope.
///
/// Reads and inserts are public; invalidation is crate-private so that
/// only the CRUD facade can drop a family, and only after an acknowledged
/// write.
#[derive(Debug, Default)]
pub struct QueryCache {
    pages: DashMap<CacheKey, CachedPage>,
    versions: DashMap<String, watch::Sender<u64>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, family: &str, query: &ListQuery) -> Option<CachedPage> {
        self.pages
            .get(&CacheKey::new(family, query))
            .map(|entry| entry.value().clone())
    }

    /// Current invalidation version of a family.
    pub fn version(&self, family: &str) -> u64 {
        *self.sender(family).borrow()
    }

    /// Store a page fetched while the family was at `seen_version`.
    ///
    /// Returns `false` (and stores nothing) when the family was invalidated
    /// after the fetch started.
    pub fn insert(
        &self,
        family: &str,
        query: &ListQuery,
        page: CachedPage,
        seen_version: u64,
    ) -> bool {
        if self.version(family) != seen_version {
            debug!(family, "dropping page fetched before invalidation");
            return false;
        }
        self.pages.insert(CacheKey::new(family, query), page);
        true
    }

    /// Subscribe to a family's invalidation counter.
    pub fn subscribe(&self, family: &str) -> watch::Receiver<u64> {
        self.sender(family).subscribe()
    }

    /// Number of cached pages for a family.
    pub fn len(&self, family: &str) -> usize {
        self.pages.iter().filter(|e| e.key().family == family).count()
    }

    pub fn is_empty(&self, family: &str) -> bool {
        self.len(family) == 0
    }

    /// Drop every cached page of a family and notify its watchers.
    pub(crate) fn invalidate_family(&self, family: &str) {
        self.pages.retain(|key, _| key.family != family);
        self.sender(family).send_modify(|v| *v += 1);
        debug!(family, version = self.version(family), "invalidated family");
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn sender(&self, family: &str) -> watch::Sender<u64> {
        self.versions
            .entry(family.to_owned())
            .or_insert_with(|| watch::channel(0).0)
            .value()
            .clone()
    }
}
