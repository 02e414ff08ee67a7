// ── List query state ──
//
// `ListQuery` is the typed view of the address-bar query. The codec in
// `codec.rs` converts to and from the flat string map; the address bar
// stays the only durable copy.

mod address_bar;
mod codec;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use address_bar::{MemoryQueryStore, QueryStore};
pub use codec::{RawQuery, decode, encode, transport_params};

/// Page sizes offered by the table footer.
pub const PAGE_SIZES: [u32; 5] = [10, 20, 30, 40, 50];
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_SORT_BY: &str = "createdAt";

/// Address-bar keys with a dedicated `ListQuery` slot. Anything else is a
/// filter.
pub const RESERVED_KEYS: [&str; 5] = ["page", "pageSize", "search", "sortBy", "sortOrder"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Lenient parse; anything unrecognised is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed list query. Every instance is valid: `page >= 1` and `page_size`
/// is one of [`PAGE_SIZES`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    page: u32,
    page_size: u32,
    search: Option<String>,
    sort_by: String,
    sort_order: SortOrder,
    filters: BTreeMap<String, String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            sort_by: DEFAULT_SORT_BY.to_owned(),
            sort_order: SortOrder::Desc,
            filters: BTreeMap::new(),
        }
    }
}

impl ListQuery {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn sort_by(&self) -> &str {
        &self.sort_by
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    // ── Builders (always yield a valid query) ────────────────────────

    /// Page numbers below 1 clamp to 1.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Snaps to the nearest allowed page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = nearest_page_size(page_size);
        self
    }

    /// Blank searches clear the search.
    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        self
    }

    /// A blank column falls back to `createdAt`.
    pub fn with_sort(mut self, sort_by: &str, sort_order: SortOrder) -> Self {
        let sort_by = sort_by.trim();
        self.sort_by = if sort_by.is_empty() {
            DEFAULT_SORT_BY.to_owned()
        } else {
            sort_by.to_owned()
        };
        self.sort_order = sort_order;
        self
    }

    /// Set or clear (`None` / blank) one filter. Reserved keys are ignored
    /// because they would not survive the address bar.
    pub fn with_filter(mut self, key: &str, value: Option<&str>) -> Self {
        let key = key.trim();
        if key.is_empty() || RESERVED_KEYS.contains(&key) {
            return self;
        }
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => {
                self.filters.insert(key.to_owned(), v.to_owned());
            }
            None => {
                self.filters.remove(key);
            }
        }
        self
    }

    pub fn clear_filters(mut self) -> Self {
        self.filters.clear();
        self
    }

    /// Whether anything other than paging differs between two queries.
    fn criteria_differ(&self, other: &Self) -> bool {
        self.search != other.search
            || self.sort_by != other.sort_by
            || self.sort_order != other.sort_order
            || self.filters != other.filters
    }

    /// Resolve a user-driven change from `self` to `next`.
    ///
    /// Changing search, filters or sorting jumps back to page 1; changing
    /// only the page or page size keeps everything else.
    pub fn transition(&self, next: Self) -> Self {
        if self.criteria_differ(&next) {
            next.with_page(1)
        } else {
            next
        }
    }

    /// Apply a partial update, then [`transition`](Self::transition).
    pub fn apply(&self, patch: QueryPatch) -> Self {
        let mut next = self.clone();
        if let Some(page) = patch.page {
            next = next.with_page(page);
        }
        if let Some(page_size) = patch.page_size {
            next = next.with_page_size(page_size);
        }
        if let Some(search) = patch.search {
            next = next.with_search(search.as_deref());
        }
        if patch.sort_by.is_some() || patch.sort_order.is_some() {
            let sort_by = patch.sort_by.unwrap_or_else(|| next.sort_by.clone());
            let sort_order = patch.sort_order.unwrap_or(next.sort_order);
            next = next.with_sort(&sort_by, sort_order);
        }
        for (key, value) in patch.filters {
            next = next.with_filter(&key, value.as_deref());
        }
        self.transition(next)
    }
}

/// Partial update to a [`ListQuery`]; `None` leaves a slot unchanged.
///
/// `search` and filter values are doubly optional: `Some(None)` clears.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPatch {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<Option<String>>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filters: BTreeMap<String, Option<String>>,
}

impl QueryPatch {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn page_size(page_size: u32) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: Some(Some(search.into())),
            ..Self::default()
        }
    }

    pub fn sort(sort_by: impl Into<String>, sort_order: SortOrder) -> Self {
        Self {
            sort_by: Some(sort_by.into()),
            sort_order: Some(sort_order),
            ..Self::default()
        }
    }

    pub fn filter(key: impl Into<String>, value: Option<String>) -> Self {
        let mut filters = BTreeMap::new();
        filters.insert(key.into(), value);
        Self {
            filters,
            ..Self::default()
        }
    }
}

/// Snap an arbitrary number to the closest allowed page size; ties go to
/// the smaller size and 0 falls back to the default.
pub fn nearest_page_size(requested: u32) -> u32 {
    if requested == 0 {
        return DEFAULT_PAGE_SIZE;
    }
    PAGE_SIZES
        .iter()
        .copied()
        .min_by_key(|size| (size.abs_diff(requested), *size))
        .unwrap_or(DEFAULT_PAGE_SIZE)
}
