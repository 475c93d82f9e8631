//! Wire transport - the only place that talks to reqwest

use async_trait::async_trait;

use crate::config::Config;
use crate::models::{HeaderEntry, HttpMethod};
use crate::network::client::ExchangeError;

/// A fully validated request, ready to go on the wire
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingRequest {
    pub method: HttpMethod,
    pub url: reqwest::Url,
    pub headers: Vec<HeaderEntry>,
    /// Only set for methods that carry a body
    pub body: Option<String>,
}

/// Response as read off the wire, body fully buffered
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// One entry per header name, repeated values joined with ", "
    pub headers: Vec<HeaderEntry>,
    pub body: Vec<u8>,
}

/// Sends one request and buffers the whole response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, ExchangeError>;
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::DELETE => reqwest::Method::DELETE,
            HttpMethod::PATCH => reqwest::Method::PATCH,
        }
    }
}

/// Production transport backed by a shared `reqwest::Client`
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a client with the configured connect and overall timeouts
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(ReqwestTransport { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, ExchangeError> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url);

        for header in &request.headers {
            builder = builder.header(header.key.as_str(), header.value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let req = builder.build().map_err(classify_error)?;
        let resp = self.client.execute(req).await.map_err(classify_error)?;

        let status = resp.status().as_u16();
        let headers = collect_headers(resp.headers());
        let body = resp.bytes().await.map_err(classify_error)?;

        Ok(RawResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

/// Group response headers by name, first-seen order, values joined with ", "
pub fn collect_headers(map: &reqwest::header::HeaderMap) -> Vec<HeaderEntry> {
    map.keys()
        .map(|name| {
            let value = map
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            HeaderEntry::new(name.as_str(), value)
        })
        .collect()
}

fn classify_error(e: reqwest::Error) -> ExchangeError {
    if e.is_timeout() {
        ExchangeError::Timeout
    } else if e.is_builder() {
        ExchangeError::InvalidRequest(e.to_string())
    } else if e.is_connect() {
        ExchangeError::Connect(error_chain(&e))
    } else {
        ExchangeError::Network(error_chain(&e))
    }
}

// reqwest's top-level message hides the root cause (refused, DNS, TLS)
fn error_chain(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}
