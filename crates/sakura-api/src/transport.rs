// HTTP transport
//
// `Transport` is the seam between the panel protocol and the wire. The
// facade only ever calls `send`; retries, timeouts and TLS live in the
// implementation. `HttpTransport` is the reqwest-backed one used in
// production, tests swap in fakes.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{BoxError, Error};
use crate::request::PanelRequest;

/// Header carrying the shared panel secret.
pub const KEY_HEADER: &str = "key";

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Body as text, lossily decoded, for diagnostics.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends a panel request and returns the raw response.
///
/// Any status code counts as a response; only failures to send or receive
/// are errors.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &PanelRequest,
    ) -> impl Future<Output = Result<RawResponse, BoxError>> + Send;

    /// Toggle verbose request/response logging.
    fn set_debug(&mut self, _enabled: bool) {}
}

// ── Configuration ────────────────────────────────────────────────────

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed panels).
    DangerAcceptInvalid,
}

/// Transport tuning shared by every request of a client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Extra attempts after a connect or timeout failure.
    pub retries: u32,
    pub retry_wait: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(5),
            retries: 3,
            retry_wait: Duration::from_millis(100),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with the given default headers.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("sakura-api/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── reqwest transport ────────────────────────────────────────────────

/// `Transport` over `reqwest`, with the panel key as a default header.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    retries: u32,
    retry_wait: Duration,
    debug: bool,
}

impl HttpTransport {
    /// Build from the panel host, shared secret and transport tuning.
    pub fn new(
        base_url: Url,
        key: &SecretString,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(key.expose_secret())
            .map_err(|e| Error::InvalidKey(e.to_string()))?;
        key_value.set_sensitive(true);
        headers.insert(KEY_HEADER, key_value);

        let http = config.build_client_with_headers(headers)?;
        Ok(Self::with_client(http, base_url, config))
    }

    /// Wrap an existing `reqwest::Client` (caller manages the key header).
    pub fn with_client(http: reqwest::Client, base_url: Url, config: &TransportConfig) -> Self {
        Self {
            http,
            base_url,
            retries: config.retries,
            retry_wait: config.retry_wait,
            debug: false,
        }
    }

    /// The panel base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join the base URL with an absolute endpoint path.
    ///
    /// Any path already on the base URL is kept as a prefix.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
    }

    async fn send_once(
        &self,
        url: Url,
        request: &PanelRequest,
    ) -> Result<RawResponse, reqwest::Error> {
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .query(&request.query);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &PanelRequest) -> Result<RawResponse, BoxError> {
        let url = self.endpoint_url(request.path)?;
        debug!("{} {}", request.method, url);
        if self.debug {
            if let Some(ref body) = request.body {
                debug!(path = request.path, %body, "request body");
            }
        }

        let mut attempt = 0;
        let response = loop {
            match self.send_once(url.clone(), request).await {
                Ok(resp) => break resp,
                Err(e) if attempt < self.retries && (e.is_connect() || e.is_timeout()) => {
                    attempt += 1;
                    warn!(path = request.path, attempt, error = %e, "retrying panel request");
                    tokio::time::sleep(self.retry_wait).await;
                }
                Err(e) => return Err(Box::new(e)),
            }
        };

        if self.debug {
            debug!(
                path = request.path,
                status = response.status,
                body = %response.text(),
                "response"
            );
        } else {
            trace!(path = request.path, status = response.status, "response");
        }
        Ok(response)
    }

    fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        let base_url = Url::parse(base).expect("valid base url");
        HttpTransport::with_client(
            reqwest::Client::new(),
            base_url,
            &TransportConfig::default(),
        )
    }

    #[test]
    fn endpoint_url_keeps_base_prefix() {
        let t = transport("https://panel.example/sub/");
        let url = t.endpoint_url("/api/xray_r/node_info").expect("url");
        assert_eq!(url.as_str(), "https://panel.example/sub/api/xray_r/node_info");
    }

    #[test]
    fn endpoint_url_on_bare_host() {
        let t = transport("http://127.0.0.1:8000");
        let url = t.endpoint_url("/api/xray_r/user_list").expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/api/xray_r/user_list");
    }

    #[test]
    fn key_must_be_a_valid_header_value() {
        let base_url = Url::parse("http://127.0.0.1:8000").expect("valid base url");
        let key = SecretString::from("bad\nkey".to_string());
        let result = HttpTransport::new(base_url, &key, &TransportConfig::default());
        assert!(matches!(result, Err(Error::InvalidKey(_))));
    }

    #[test]
    fn default_config_matches_agent_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retries, 3);
    }
}
