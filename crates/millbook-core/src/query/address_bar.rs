// Address-bar collaborator
//
// The router owns the durable query. The list controller reads it once on
// mount and replaces it after every change.

use std::sync::Mutex;

use super::RawQuery;
use crate::sync::lock;

/// Read / replace access to the current address-bar query map.
pub trait QueryStore: Send + Sync {
    fn read(&self) -> RawQuery;
    fn replace(&self, raw: RawQuery);
}

/// In-process address bar for the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryQueryStore {
    raw: Mutex<RawQuery>,
}

impl MemoryQueryStore {
    pub fn new(raw: RawQuery) -> Self {
        Self {
            raw: Mutex::new(raw),
        }
    }
}

impl QueryStore for MemoryQueryStore {
    fn read(&self) -> RawQuery {
        lock(&self.raw).clone()
    }

    fn replace(&self, raw: RawQuery) {
        *lock(&self.raw) = raw;
    }
}
