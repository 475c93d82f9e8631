//! HTTP executor - validates, dispatches and measures one exchange

use std::sync::Arc;
use std::time::Instant;

use encoding_rs::Encoding;
use thiserror::Error;

use crate::config::Config;
use crate::format::pretty_print;
use crate::headers;
use crate::models::{HeaderEntry, HttpMethod, RequestData};
use crate::network::transport::{OutgoingRequest, ReqwestTransport, Transport};

/// Everything needed to perform one exchange, captured at dispatch time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeSpec {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<HeaderEntry>,
    pub body: String,
}

impl ExchangeSpec {
    /// Snapshot the request side of a tab
    pub fn from_request(data: &RequestData) -> Self {
        ExchangeSpec {
            method: data.method,
            url: data.url.clone(),
            headers: headers::parse(&data.request_headers),
            body: data.request_body.clone(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("URL cannot be empty")]
    EmptyUrl,
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Network(String),
}

impl ExchangeError {
    /// Errors detected before anything was sent
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ExchangeError::EmptyUrl | ExchangeError::InvalidUrl { .. } | ExchangeError::InvalidRequest(_)
        )
    }
}

/// A completed exchange
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeResponse {
    pub status_code: u16,
    pub duration_ms: u64,
    pub size_bytes: usize,
    pub headers: Vec<HeaderEntry>,
    pub raw_body: String,
    /// `raw_body` pretty-printed when it is JSON; this is what gets stored
    pub body: String,
}

/// A failed exchange, with the time spent before it failed
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{error}")]
pub struct ExchangeFailure {
    #[source]
    pub error: ExchangeError,
    pub duration_ms: u64,
}

impl ExchangeFailure {
    /// A failure raised before dispatch
    pub fn immediate(error: ExchangeError) -> Self {
        ExchangeFailure {
            error,
            duration_ms: 0,
        }
    }
}

pub type ExchangeResult = Result<ExchangeResponse, ExchangeFailure>;

/// Runs exchanges over a shared transport. Cloning is cheap and clones share
/// only the (immutable) transport.
#[derive(Clone)]
pub struct HttpExecutor {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExecutor").finish_non_exhaustive()
    }
}

impl HttpExecutor {
    /// Executor backed by reqwest with the configured timeouts
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new(config)?)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        HttpExecutor { transport }
    }

    /// Check the spec and build the wire request without sending anything
    pub fn validate(&self, spec: &ExchangeSpec) -> Result<OutgoingRequest, ExchangeError> {
        build_request(spec)
    }

    /// Perform one exchange. Never panics; every failure comes back as
    /// [`ExchangeFailure`].
    pub async fn execute(&self, spec: ExchangeSpec) -> ExchangeResult {
        let request = build_request(&spec).map_err(ExchangeFailure::immediate)?;

        tracing::info!(method = spec.method.as_str(), url = %request.url, "Executing request");
        let start = Instant::now();
        let result = self.transport.send(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(raw) => {
                let size_bytes = raw.body.len();
                let raw_body = decode_body(&raw.body, &raw.headers);
                let body = pretty_print(&raw_body);
                tracing::info!(status = raw.status, duration_ms, size_bytes, "Request completed");
                Ok(ExchangeResponse {
                    status_code: raw.status,
                    duration_ms,
                    size_bytes,
                    headers: raw.headers,
                    raw_body,
                    body,
                })
            }
            Err(error) => {
                tracing::info!(duration_ms, error = %error, "Request failed");
                Err(ExchangeFailure { error, duration_ms })
            }
        }
    }
}

/// Decode a response body with the charset its Content-Type declares,
/// falling back to UTF-8
pub fn decode_body(body: &[u8], headers: &[HeaderEntry]) -> String {
    let encoding = headers
        .iter()
        .find(|h| h.key.eq_ignore_ascii_case("content-type"))
        .and_then(|h| charset_label(&h.value))
        .and_then(|label| Encoding::for_label(label.as_bytes()));

    match encoding {
        Some(encoding) => encoding.decode(body).0.into_owned(),
        None => String::from_utf8_lossy(body).into_owned(),
    }
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

fn build_request(spec: &ExchangeSpec) -> Result<OutgoingRequest, ExchangeError> {
    let raw_url = spec.url.trim();
    if raw_url.is_empty() {
        return Err(ExchangeError::EmptyUrl);
    }

    let url = reqwest::Url::parse(raw_url).map_err(|e| ExchangeError::InvalidUrl {
        url: raw_url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExchangeError::InvalidUrl {
            url: raw_url.to_string(),
            reason: format!("unsupported scheme {:?}", url.scheme()),
        });
    }

    let headers = spec
        .headers
        .iter()
        .filter(|h| !h.key.is_empty())
        .cloned()
        .collect();

    let body = spec.method.has_body().then(|| spec.body.clone());

    Ok(OutgoingRequest {
        method: spec.method,
        url,
        headers,
        body,
    })
}
