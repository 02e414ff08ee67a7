// ── Core error types ──
//
// User-facing errors from millbook-core. Consumers never see reqwest
// errors or JSON parse failures directly; the `From<millbook_api::Error>`
// impl translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Shown when a failure carries no message of its own.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Record not found: {resource} with id {identifier}")]
    NotFound {
        resource: String,
        identifier: String,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Programmer errors ────────────────────────────────────────────
    /// A derivation rule would write a field it depends on, or a field
    /// another rule already writes.
    #[error("Invalid derivation rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    /// An operation was invoked in a dialog state that does not allow it.
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    // ── Import errors ────────────────────────────────────────────────
    #[error("Import failed: {message}")]
    Import { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The message worth showing to a user verbatim, if the failure carried
    /// one. Callers fall back to a generic message when this is `None`.
    pub fn user_message(&self) -> Option<String> {
        let message = match self {
            Self::Api { message, .. } | Self::Import { message } => message.clone(),
            Self::NotFound { .. }
            | Self::ConnectionFailed { .. }
            | Self::Timeout { .. }
            | Self::InvalidState { .. } => self.to_string(),
            _ => return None,
        };
        (!message.trim().is_empty()).then_some(message)
    }

    /// [`user_message`](Self::user_message), or [`GENERIC_FAILURE`].
    pub fn notice_message(&self) -> String {
        self.user_message()
            .unwrap_or_else(|| GENERIC_FAILURE.to_owned())
    }

    /// Returns `true` for programmer errors (violated invariants).
    pub fn is_state_error(&self) -> bool {
        matches!(self, Self::InvalidRule { .. } | Self::InvalidState { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<millbook_api::Error> for CoreError {
    fn from(err: millbook_api::Error) -> Self {
        match err {
            millbook_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            millbook_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            millbook_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            millbook_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            millbook_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            millbook_api::Error::Rejected {
                message,
                status_code,
            } => CoreError::Api {
                message,
                status: status_code,
            },
            millbook_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_message_passes_through() {
        let err = CoreError::from(millbook_api::Error::Api {
            status: 422,
            message: "Rate must be positive".into(),
        });
        assert_eq!(err.user_message().as_deref(), Some("Rate must be positive"));
    }

    #[test]
    fn empty_api_message_has_no_user_message() {
        let err = CoreError::from(millbook_api::Error::Rejected {
            message: String::new(),
            status_code: None,
        });
        assert_eq!(err.user_message(), None);
        assert_eq!(err.notice_message(), GENERIC_FAILURE);
    }

    #[test]
    fn bare_http_failure_falls_back_to_generic_message() {
        let err = CoreError::from(millbook_api::Error::Api {
            status: 500,
            message: String::new(),
        });
        assert_eq!(err.notice_message(), GENERIC_FAILURE);
    }

    #[test]
    fn timeout_keeps_configured_seconds() {
        let err = CoreError::from(millbook_api::Error::Timeout { timeout_secs: 5 });
        assert_eq!(err, CoreError::Timeout { timeout_secs: 5 });
        assert_eq!(err.notice_message(), "Request timed out after 5s");
    }

    #[test]
    fn deserialization_errors_are_internal() {
        let err = CoreError::from(millbook_api::Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        });
        assert!(matches!(err, CoreError::Internal(_)));
        assert_eq!(err.user_message(), None);
    }
}
