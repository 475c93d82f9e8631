//! Recording transport for unit tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::network::client::ExchangeError;
use crate::network::transport::{OutgoingRequest, RawResponse, Transport};

type Reply = Result<RawResponse, ExchangeError>;

/// Records every request and answers with a canned reply, optionally after
/// a per-URL delay
pub struct MockTransport {
    reply: Reply,
    replies_by_url: HashMap<String, (Duration, Reply)>,
    requests: Mutex<Vec<OutgoingRequest>>,
}

impl MockTransport {
    pub fn with_response(response: RawResponse) -> Self {
        MockTransport {
            reply: Ok(response),
            replies_by_url: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(status: u16, body: &str) -> Self {
        Self::with_response(RawResponse {
            status,
            headers: vec![],
            body: body.as_bytes().to_vec(),
        })
    }

    pub fn failing(error: ExchangeError) -> Self {
        MockTransport {
            reply: Err(error),
            replies_by_url: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer requests for `url` with `reply` after `delay`
    pub fn route(mut self, url: &str, delay: Duration, reply: Reply) -> Self {
        self.replies_by_url.insert(url.to_string(), (delay, reply));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, ExchangeError> {
        let routed = self.replies_by_url.get(request.url.as_str()).cloned();
        self.requests.lock().unwrap().push(request);

        match routed {
            Some((delay, reply)) => {
                tokio::time::sleep(delay).await;
                reply
            }
            None => self.reply.clone(),
        }
    }
}
