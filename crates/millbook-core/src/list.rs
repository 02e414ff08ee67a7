// ── Server-paginated list controller ──
//
// Owns one resource family's list query, mirrors it into the address bar,
// fetches pages through the scope's transport and publishes the result on
// a `watch` channel. Only the most recently requested query may land in
// the state: every fetch takes a sequence number and superseded tasks are
// aborted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use millbook_api::RecordPage;

use crate::convert::page_to_domain;
use crate::error::CoreError;
use crate::model::{PaginationMeta, Resource, Row};
use crate::query::{ListQuery, QueryPatch, QueryStore, decode, encode, transport_params};
use crate::scope::{Notice, Scope};
use crate::store::CachedPage;
use crate::stream::ListStream;
use crate::sync::lock;

/// Snapshot of a list as rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    pub query: ListQuery,
    /// Rows of the current page only.
    pub data: Arc<Vec<Row>>,
    /// Zeroed until the first fetch lands.
    pub pagination: PaginationMeta,
    pub is_loading: bool,
    /// Set when the latest fetch failed; `data` then still holds the
    /// previous page.
    pub is_error: bool,
    /// The failure behind `is_error`.
    pub last_error: Option<CoreError>,
}

impl ListState {
    fn initial(query: ListQuery) -> Self {
        Self {
            query,
            data: Arc::new(Vec::new()),
            pagination: PaginationMeta::default(),
            is_loading: true,
            is_error: false,
            last_error: None,
        }
    }
}

/// Handle to a mounted list. Clones share the same state.
#[derive(Clone)]
pub struct ListController {
    inner: Arc<ListInner>,
}

struct ListInner {
    scope: Scope,
    resource: Resource,
    address_bar: Arc<dyn QueryStore>,
    state: watch::Sender<Arc<ListState>>,
    /// Sequence number of the latest requested fetch.
    seq: AtomicU64,
    in_flight: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl ListController {
    /// Mount a list: decode the address bar, start the first fetch and
    /// start watching the family for invalidations.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(scope: Scope, resource: Resource, address_bar: Arc<dyn QueryStore>) -> Self {
        let query = decode(&address_bar.read());
        let (state, _) = watch::channel(Arc::new(ListState::initial(query.clone())));
        let controller = Self {
            inner: Arc::new(ListInner {
                scope,
                resource,
                address_bar,
                state,
                seq: AtomicU64::new(0),
                in_flight: Mutex::new(None),
                cancel: CancellationToken::new(),
            }),
        };

        tokio::spawn(invalidation_task(
            Arc::downgrade(&controller.inner),
            controller.inner.scope.cache().subscribe(controller.family()),
            controller.inner.cancel.clone(),
        ));
        controller.fetch(query, false);
        controller
    }

    // ── State access ─────────────────────────────────────────────────

    pub fn state(&self) -> Arc<ListState> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> ListStream {
        ListStream::new(self.inner.state.subscribe())
    }

    pub fn query(&self) -> ListQuery {
        self.state().query.clone()
    }

    pub fn data(&self) -> Arc<Vec<Row>> {
        Arc::clone(&self.state().data)
    }

    pub fn pagination(&self) -> PaginationMeta {
        self.state().pagination
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn is_error(&self) -> bool {
        self.state().is_error
    }

    pub fn resource(&self) -> &Resource {
        &self.inner.resource
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Merge a partial update into the query and fetch.
    ///
    /// Changing search, filters or sorting resets the page to 1.
    pub fn set_query_params(&self, patch: QueryPatch) {
        let next = self.query().apply(patch);
        self.navigate(next);
    }

    /// Functional form of [`set_query_params`](Self::set_query_params).
    pub fn update_query(&self, updater: impl FnOnce(&ListQuery) -> ListQuery) {
        let current = self.query();
        let next = current.transition(updater(&current));
        self.navigate(next);
    }

    /// Re-issue the current query, bypassing the cache.
    pub fn refresh(&self) {
        self.fetch(self.query(), true);
    }

    /// Stop watching for invalidations and abort any in-flight fetch.
    pub fn unmount(&self) {
        self.inner.shutdown();
    }

    // ── Internals ────────────────────────────────────────────────────

    fn family(&self) -> &str {
        self.inner.resource.path()
    }

    fn navigate(&self, next: ListQuery) {
        self.inner.address_bar.replace(encode(&next));
        self.fetch(next, false);
    }

    fn fetch(&self, query: ListQuery, bypass_cache: bool) {
        let inner = &self.inner;
        if inner.cancel.is_cancelled() {
            return;
        }
        let seq = inner.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let cache = inner.scope.cache();

        let hit = if bypass_cache {
            None
        } else {
            cache.get(self.family(), &query)
        };
        if let Some(hit) = hit {
            debug!(family = self.family(), page = query.page(), "list cache hit");
            inner.abort_in_flight();
            inner.state.send_modify(|state| {
                *state = Arc::new(ListState {
                    query,
                    data: hit.rows,
                    pagination: hit.pagination,
                    is_loading: false,
                    is_error: false,
                    last_error: None,
                });
            });
            return;
        }

        inner.state.send_modify(|state| {
            let mut next = (**state).clone();
            next.query = query.clone();
            next.is_loading = true;
            *state = Arc::new(next);
        });

        let seen_version = cache.version(self.family());
        let transport = Arc::clone(inner.scope.transport());
        let mill_id = inner.scope.mill_id().to_owned();
        let family = self.family().to_owned();
        let weak = Arc::downgrade(inner);

        let handle = tokio::spawn(async move {
            let params = transport_params(&query);
            let result = transport.list(&mill_id, &family, &params).await;
            if let Some(inner) = weak.upgrade() {
                inner.complete(seq, query, seen_version, result);
            }
        });

        let previous = lock(&inner.in_flight).replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl ListInner {
    fn complete(
        &self,
        seq: u64,
        query: ListQuery,
        seen_version: u64,
        result: Result<RecordPage, CoreError>,
    ) {
        let family = self.resource.path();
        if seq != self.seq.load(Ordering::SeqCst) {
            debug!(family, seq, "discarding superseded list response");
            return;
        }

        match result {
            Ok(page) => {
                let (rows, pagination) = page_to_domain(page, &query);
                let rows = Arc::new(rows);
                self.scope.cache().insert(
                    family,
                    &query,
                    CachedPage {
                        rows: Arc::clone(&rows),
                        pagination,
                    },
                    seen_version,
                );
                debug!(family, rows = rows.len(), total = pagination.total, "list page loaded");
                self.state.send_modify(|state| {
                    *state = Arc::new(ListState {
                        query,
                        data: rows,
                        pagination,
                        is_loading: false,
                        is_error: false,
                        last_error: None,
                    });
                });
            }
            Err(e) => {
                warn!(family, error = %e, "list fetch failed");
                let notice = Notice::error(e.notice_message());
                self.state.send_modify(|state| {
                    let mut next = (**state).clone();
                    next.is_loading = false;
                    next.is_error = true;
                    next.last_error = Some(e);
                    *state = Arc::new(next);
                });
                self.scope.notifier().notify(notice);
            }
        }
    }

    fn abort_in_flight(&self) {
        if let Some(handle) = lock(&self.in_flight).take() {
            handle.abort();
        }
    }

    fn shutdown(&self) {
        self.cancel.cancel();
        self.abort_in_flight();
    }
}

impl Drop for ListInner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Re-fetch the current query whenever the family is invalidated.
async fn invalidation_task(
    inner: Weak<ListInner>,
    mut versions: watch::Receiver<u64>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = versions.changed() => {
                if changed.is_err() {
                    break;
                }
                let Some(inner) = inner.upgrade() else { break };
                let controller = ListController { inner };
                debug!(family = controller.family(), "family invalidated, refetching");
                controller.refresh();
            }
        }
    }
}
