// ── Query cache ──

mod cache;

pub use cache::{CachedPage, QueryCache};
