// ── Domain model ──

pub mod ledger;
pub mod pagination;
pub mod row;

pub use ledger::{Ledger, Resource};
pub use pagination::PaginationMeta;
pub use row::{Row, RowId};
