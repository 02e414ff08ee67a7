// Back-office HTTP client
//
// Wraps `reqwest::Client` with mill-scoped URL construction and envelope
// unwrapping. Endpoint methods live in `records.rs` as inherent methods
// to keep this module focused on transport mechanics.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::Envelope;
use crate::transport::TransportConfig;

/// Raw HTTP client for the back-office API.
///
/// Handles the `{statusCode, data, message, success}` envelope and
/// `/mills/{mill_id}/{resource}` URL construction. All methods return the
/// unwrapped `data` payload; the envelope is stripped before the caller
/// sees it. The mill is passed per call so one client can serve several
/// tenants at once.
#[derive(Debug, Clone)]
pub struct MillClient {
    http: reqwest::Client,
    base_url: Url,
    /// Reported in `Error::Timeout`; the limit itself lives in `http`.
    timeout: Duration,
}

impl MillClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the API root, e.g. `https://erp.example.com/api/v1`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url).with_timeout(transport.timeout))
    }

    /// Create a client with a pre-built `reqwest::Client`. The timeout
    /// reported on failures defaults to `TransportConfig::default()`'s.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: TransportConfig::default().timeout,
        }
    }

    /// Set the timeout reported when a request times out.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a resource URL: `{base}/mills/{mill_id}/{resource}[/{suffix}]`.
    ///
    /// `resource` may contain slashes (e.g. `purchases/frk`); each segment
    /// is pushed separately so ids and names are percent-encoded.
    pub(crate) fn resource_url(
        &self,
        mill_id: &str,
        resource: &str,
        suffix: Option<&str>,
    ) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            segments.pop_if_empty().push("mills").push(mill_id);
            segments.extend(resource.split('/').filter(|s| !s.is_empty()));
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Send a GET request with query parameters and return the envelope.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(String, String)],
    ) -> Result<Envelope<T>, Error> {
        debug!("GET {url} params={params:?}");

        let resp = self
            .http
            .get(url).query(params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.parse_envelope(resp).await
    }

    /// Send a POST request with a JSON body and return the envelope.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Envelope<T>, Error> {
        debug!("POST {url}");

        let resp = self
            .http
            .post(url).json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.parse_envelope(resp).await
    }

    /// Send a PUT request with a JSON body and return the envelope.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Envelope<T>, Error> {
        debug!("PUT {url}");

        let resp = self
            .http
            .put(url).json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.parse_envelope(resp).await
    }

    /// Send a DELETE request, optionally with a JSON body.
    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<Envelope<T>, Error> {
        debug!("DELETE {url}");

        let mut builder = self.http.delete(url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await.map_err(|e| self.transport_error(e))?;
        self.parse_envelope(resp).await
    }

    /// Parse the `{statusCode, data, message, success}` envelope.
    ///
    /// Non-2xx statuses become `Error::Api` carrying the envelope message,
    /// left empty when the body has none. A 2xx body with `success: false`
    /// becomes `Error::Rejected`. An empty 2xx body is treated as an
    /// envelope with no data.
    async fn parse_envelope<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<Envelope<T>, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|env| env.message)
                .unwrap_or_default();
            if message.is_empty() {
                let preview: String = body.chars().take(200).collect();
                debug!(%status, body = %preview, "error response without message");
            }
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            trace!(%status, "empty response body");
            return Ok(Envelope {
                status_code: Some(status.as_u16()),
                data: None,
                message: None,
                success: None,
                pagination: None,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        if envelope.success == Some(false) {
            return Err(Error::Rejected {
                message: envelope.message.unwrap_or_default(),
                status_code: envelope.status_code,
            });
        }

        Ok(envelope)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> MillClient {
        MillClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn resource_url_joins_segments() {
        let c = client("https://erp.example.com/api/v1/");
        let url = c.resource_url("mill-7", "frk-purchases", None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://erp.example.com/api/v1/mills/mill-7/frk-purchases"
        );
    }

    #[test]
    fn resource_url_handles_nested_resource_and_suffix() {
        let c = client("https://erp.example.com");
        let url = c
            .resource_url("m1", "purchases/paddy", Some("bulk"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://erp.example.com/mills/m1/purchases/paddy/bulk"
        );
    }

    #[test]
    fn resource_url_encodes_ids() {
        let c = client("https://erp.example.com");
        let url = c.resource_url("m1", "parties", Some("a b/c")).unwrap();
        assert_eq!(url.path(), "/mills/m1/parties/a%20b%2Fc");
    }
}
