use thiserror::Error;

/// Boxed cause carried by transport failures.
///
/// The transport is pluggable, so its failure type is erased here. The
/// reqwest-backed transport boxes `reqwest::Error`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type for the `sakura-api` crate.
///
/// The first four variants classify a failed panel call, from the outermost
/// layer inwards: the request never completed, the panel answered with an
/// HTTP error, the body was not JSON, or the envelope carried a non-success
/// code. The remaining variants can only occur while building a client or
/// a request body.
#[derive(Debug, Error)]
pub enum Error {
    // ── Call failures ───────────────────────────────────────────────
    /// Send/receive failed; the call never reached or returned from the panel.
    #[error("request {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: BoxError,
    },

    /// HTTP status >= 400. The body is kept verbatim for diagnostics.
    #[error("request {path} failed with HTTP {status}: {body}")]
    Http {
        path: String,
        status: u16,
        body: String,
    },

    /// Response body is not valid JSON.
    #[error("response from {path} is not valid JSON ({message}): {body}")]
    MalformedBody {
        path: String,
        message: String,
        body: String,
    },

    /// Valid envelope, but `response.code` was missing or not 200.
    #[error("request {path} rejected by panel (code {}): {message}", display_code(.code))]
    Application {
        path: String,
        code: Option<i64>,
        message: String,
        body: String,
    },

    // ── Construction ────────────────────────────────────────────────
    /// API host could not be parsed or joined with an endpoint path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The shared secret cannot be sent as an HTTP header value.
    #[error("Invalid panel key: {0}")]
    InvalidKey(String),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// A request body could not be serialized.
    #[error("Failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[allow(clippy::ref_option)]
fn display_code(code: &Option<i64>) -> String {
    code.map_or_else(|| "missing".into(), |c| c.to_string())
}

impl Error {
    /// Returns `true` if the failure happened below HTTP and is worth retrying
    /// on the next polling cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source
                .downcast_ref::<reqwest::Error>()
                .is_none_or(|e| e.is_timeout() || e.is_connect()),
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status of an [`Error::Http`] failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The panel's `response.code`, if the envelope carried one.
    pub fn panel_code(&self) -> Option<i64> {
        match self {
            Self::Application { code, .. } => *code,
            _ => None,
        }
    }

    /// The endpoint path of a failed call.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Transport { path, .. }
            | Self::Http { path, .. }
            | Self::MalformedBody { path, .. }
            | Self::Application { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_error_display_names_missing_code() {
        let err = Error::Application {
            path: "/api/xray_r/node_info".into(),
            code: None,
            message: "denied".into(),
            body: "{}".into(),
        };
        assert_eq!(
            err.to_string(),
            "request /api/xray_r/node_info rejected by panel (code missing): denied"
        );
        assert_eq!(err.panel_code(), None);
        assert_eq!(err.path(), Some("/api/xray_r/node_info"));
    }

    #[test]
    fn http_5xx_is_transient_but_4xx_is_not() {
        let server = Error::Http {
            path: "/x".into(),
            status: 502,
            body: String::new(),
        };
        let client = Error::Http {
            path: "/x".into(),
            status: 404,
            body: String::new(),
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
        assert_eq!(client.status(), Some(404));
    }

    #[test]
    fn non_reqwest_transport_failures_count_as_transient() {
        let err = Error::Transport {
            path: "/x".into(),
            source: "connection reset".into(),
        };
        assert!(err.is_transient());
    }
}
