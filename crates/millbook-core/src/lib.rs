//! List, dialog and form orchestration between `millbook-api` and UI
//! consumers (CLI, web shell).
//!
//! Every ledger and registry of the mill back office is a server-paginated,
//! filterable list with add / edit / delete flows. This crate owns the
//! parts of that flow that do not depend on rendering:
//!
//! - **[`ListController`]**: Owns one resource family's [`ListQuery`],
//!   keeps it in sync with the address bar ([`QueryStore`]), fetches pages
//!   through the injected transport and publishes
//!   `{data, pagination, is_loading, is_error}` as a [`ListStream`]. Only
//!   the latest requested query may land; superseded fetches are aborted.
//!
//! - **[`DialogHandle`]**: Finite dialog state machine (add / edit / view /
//!   delete / delete-multi) bound to at most one current row.
//!
//! - **[`DerivedFieldEngine`]**: Declarative derivation rules keeping
//!   dependent form fields (sums, visibility, required-ness) consistent,
//!   with per-rule trailing-edge debounce.
//!
//! - **[`ResourceCrudFacade`]**: Create / update / delete / bulk delete /
//!   import. Invalidates the family's cached queries after the backend
//!   acknowledges a write and sends exactly one notification per mutation.
//!
//! - **[`Scope`]**: Injected context (`mill_id`, transport, [`QueryCache`],
//!   [`Notifier`]) threaded through every constructor.

pub mod config;
pub mod convert;
pub mod dialog;
pub mod error;
pub mod facade;
pub mod form;
pub mod import;
pub mod list;
pub mod model;
pub mod query;
pub mod scope;
pub mod store;
pub mod stream;
mod sync;
pub mod transport;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientConfig, TlsVerification};
pub use dialog::{DialogHandle, DialogMode, DialogState, RowMode, RowSelection};
pub use error::{CoreError, GENERIC_FAILURE};
pub use facade::{PendingMutation, ResourceCrudFacade};
pub use form::{
    Derivation, DerivationRule, DerivedFieldEngine, FieldFlags, FieldValue, FormState, FormValues,
    Numeric, RuleInput,
};
pub use import::{FileParser, ImportStats, ParsedFile};
pub use list::{ListController, ListState};
pub use model::{Ledger, PaginationMeta, Resource, Row, RowId};
pub use query::{ListQuery, MemoryQueryStore, QueryPatch, QueryStore, RawQuery, SortOrder};
pub use scope::{Notice, NoticeKind, Notifier, Scope, TracingNotifier};
pub use store::QueryCache;
pub use stream::ListStream;
pub use transport::ResourceTransport;
