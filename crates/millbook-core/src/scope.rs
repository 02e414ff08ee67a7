// ── Injected cross-cutting context ──
//
// A `Scope` bundles everything a list controller or facade needs from the
// outside world: the mill being operated on, the transport, the shared
// query cache and the notification sink. It is threaded through
// constructors; nothing in the core reaches for a global.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use strum::{Display, IntoStaticStr};
use tracing::{error, info};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::store::QueryCache;
use crate::transport::ResourceTransport;

// ── Notifications ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// One user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            description: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            description: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Notification sink (toast, status line, stderr...).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that only logs. Useful where nothing renders notices.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        let description = notice.description.as_deref().unwrap_or_default();
        match notice.kind {
            NoticeKind::Error => error!(message = %notice.message, description, "notice"),
            NoticeKind::Success | NoticeKind::Info => {
                info!(kind = %notice.kind, message = %notice.message, description, "notice");
            }
        }
    }
}

// ── Scope ───────────────────────────────────────────────────────────

/// Cross-cutting context for one mill.
///
/// Cheap to clone; clones share the transport, cache and notifier.
#[derive(Clone)]
pub struct Scope {
    mill_id: Arc<str>,
    transport: Arc<dyn ResourceTransport>,
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
}

impl Scope {
    /// A scope with a fresh, empty query cache.
    pub fn new(
        mill_id: impl Into<Arc<str>>,
        transport: Arc<dyn ResourceTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            mill_id: mill_id.into(),
            transport,
            cache: Arc::new(QueryCache::new()),
            notifier,
        }
    }

    /// Build the HTTP transport from `config` and wrap it in a scope.
    pub fn connect(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> Result<Self, CoreError> {
        let client = config.build_client()?;
        Ok(Self::new(config.mill_id.as_str(), Arc::new(client), notifier))
    }

    /// Share an existing cache (e.g. between two scopes for the same mill).
    pub fn with_cache(mut self, cache: Arc<QueryCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn mill_id(&self) -> &str {
        &self.mill_id
    }

    pub fn transport(&self) -> &Arc<dyn ResourceTransport> {
        &self.transport
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("mill_id", &self.mill_id)
            .finish_non_exhaustive()
    }
}
