// Address bar <-> ListQuery
//
// `decode` is total: anything malformed falls back to a default. `encode`
// omits every key equal to its default so a pristine list has an empty
// address bar.

use std::collections::BTreeMap;

use super::{
    DEFAULT_PAGE_SIZE, DEFAULT_SORT_BY, ListQuery, RESERVED_KEYS, SortOrder, nearest_page_size,
};

/// Flat string map as read from / written to the address bar.
pub type RawQuery = BTreeMap<String, String>;

fn non_empty<'a>(raw: &'a RawQuery, key: &str) -> Option<&'a str> {
    raw.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Lenient integer parse: accepts `"3"`, `" 3 "`, `"3.0"`; rejects
/// negatives, fractions and garbage.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn parse_count(raw: &str) -> Option<u32> {
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }
    let f = raw.parse::<f64>().ok()?;
    let in_range = f.is_finite() && f >= 0.0 && f <= f64::from(u32::MAX);
    (in_range && f.fract().abs() < f64::EPSILON).then_some(f as u32)
}

/// Decode an address-bar map into a valid [`ListQuery`].
pub fn decode(raw: &RawQuery) -> ListQuery {
    let page = non_empty(raw, "page")
        .and_then(parse_count)
        .filter(|p| *p >= 1)
        .unwrap_or(1);
    let page_size = non_empty(raw, "pageSize")
        .and_then(parse_count)
        .map_or(DEFAULT_PAGE_SIZE, nearest_page_size);
    let sort_by = non_empty(raw, "sortBy").unwrap_or(DEFAULT_SORT_BY);
    let sort_order = non_empty(raw, "sortOrder")
        .and_then(SortOrder::parse)
        .unwrap_or_default();

    let mut query = ListQuery::default()
        .with_page(page)
        .with_page_size(page_size)
        .with_search(non_empty(raw, "search"))
        .with_sort(sort_by, sort_order);

    for (key, value) in raw {
        if !RESERVED_KEYS.contains(&key.as_str()) {
            query = query.with_filter(key, Some(value));
        }
    }
    query
}

/// Encode a query for the address bar, omitting defaults.
pub fn encode(query: &ListQuery) -> RawQuery {
    let mut raw = RawQuery::new();
    if query.page() != 1 {
        raw.insert("page".into(), query.page().to_string());
    }
    if query.page_size() != DEFAULT_PAGE_SIZE {
        raw.insert("pageSize".into(), query.page_size().to_string());
    }
    if let Some(search) = query.search() {
        raw.insert("search".into(), search.to_owned());
    }
    if query.sort_by() != DEFAULT_SORT_BY {
        raw.insert("sortBy".into(), query.sort_by().to_owned());
    }
    if query.sort_order() != SortOrder::default() {
        raw.insert("sortOrder".into(), query.sort_order().to_string());
    }
    for (key, value) in query.filters() {
        raw.insert(key.clone(), value.clone());
    }
    raw
}

/// Query parameters for the list endpoint. Unlike [`encode`], every
/// paging and sort key is sent explicitly and the page size travels as
/// `limit`.
pub fn transport_params(query: &ListQuery) -> Vec<(String, String)> {
    let mut params = vec![
        ("page".to_owned(), query.page().to_string()),
        ("limit".to_owned(), query.page_size().to_string()),
    ];
    if let Some(search) = query.search() {
        params.push(("search".into(), search.to_owned()));
    }
    params.push(("sortBy".into(), query.sort_by().to_owned()));
    params.push(("sortOrder".into(), query.sort_order().to_string()));
    params.extend(query.filters().iter().map(|(k, v)| (k.clone(), v.clone())));
    params
}
