// ── Runtime connection configuration ──
//
// These types describe *how* to reach the back-office API and which mill
// to operate on. They never touch disk; the CLI (via millbook-config)
// constructs a `ClientConfig` and hands it in.

use std::time::Duration;

use url::Url;

use millbook_api::{MillClient, TlsMode, TransportConfig};

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed on-premise servers).
    DangerAcceptInvalid,
}

/// Configuration for talking to one mill's back office.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root (e.g., `https://erp.example.com/api/v1`).
    pub base_url: Url,
    /// Mill (tenant) every request is scoped to.
    pub mill_id: String,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Build the transport client described by this config.
    pub fn build_client(&self) -> Result<MillClient, CoreError> {
        let transport = TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        };
        Ok(MillClient::new(self.base_url.clone(), &transport)?)
    }
}
