use serde::{Deserialize, Serialize};

/// Pagination metadata for the page currently on screen.
///
/// Always derived from the server response (see
/// [`convert::normalize_pagination`](crate::convert::normalize_pagination));
/// the client only ever holds one page of rows, so it never recomputes
/// totals from data. `Default` is the zeroed meta shown while the first
/// fetch is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
}

impl PaginationMeta {
    /// 1-based index of the first row on this page, 0 when empty.
    pub fn first_row(&self) -> u64 {
        if self.total == 0 || self.page == 0 {
            return 0;
        }
        u64::from(self.page - 1) * u64::from(self.limit) + 1
    }

    /// 1-based index of the last row on this page, 0 when empty.
    pub fn last_row(&self) -> u64 {
        if self.total == 0 || self.page == 0 {
            return 0;
        }
        (u64::from(self.page) * u64::from(self.limit)).min(self.total)
    }
}
