// ── API-to-domain conversions ──
//
// Bridges raw `millbook_api` responses into `millbook_core::model` types.
// The server's pagination block is frequently partial; missing fields are
// filled from the fields that are present and from the request that
// produced the page. Row contents are never consulted.

use millbook_api::{RawPagination, RecordPage};

use crate::model::{PaginationMeta, Row};
use crate::query::ListQuery;

/// Normalize a (possibly partial) server pagination block.
pub fn normalize_pagination(raw: Option<&RawPagination>, query: &ListQuery) -> PaginationMeta {
    let raw = raw.cloned().unwrap_or_default();

    let page = raw.page.filter(|p| *p >= 1).unwrap_or(query.page());
    let limit = raw.limit.filter(|l| *l > 0).unwrap_or(query.page_size());
    let total = raw.total.unwrap_or(0);
    let total_pages = raw.total_pages.unwrap_or_else(|| pages_for(total, limit));

    let has_next_page = raw.has_next_page.unwrap_or(page < total_pages);
    let has_prev_page = raw.has_prev_page.unwrap_or(page > 1);

    PaginationMeta {
        page,
        limit,
        total,
        total_pages,
        has_prev_page,
        has_next_page,
        prev_page: raw
            .prev_page
            .or_else(|| has_prev_page.then_some(page.saturating_sub(1)).filter(|p| *p >= 1)),
        next_page: raw
            .next_page
            .or_else(|| has_next_page.then_some(page.saturating_add(1))),
    }
}

/// `ceil(total / limit)`, saturating at `u32::MAX`.
fn pages_for(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
}

/// Convert a transport page into domain rows plus normalized metadata.
pub fn page_to_domain(page: RecordPage, query: &ListQuery) -> (Vec<Row>, PaginationMeta) {
    let meta = normalize_pagination(page.pagination.as_ref(), query);
    let rows = page.rows.into_iter().map(Row::from_value).collect();
    (rows, meta)
}
