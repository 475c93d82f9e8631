//! Tab session - one tab's request/response state and its send lifecycle

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::constants::{PENDING_PLACEHOLDER, STATUS_ERROR, STATUS_SENDING};
use crate::headers;
use crate::models::{HeaderEntry, HttpMethod, RequestData};
use crate::network::{ExchangeFailure, ExchangeResult, ExchangeSpec, HttpExecutor};
use crate::storage::StorageHandle;

/// Events reported back to the orchestrator from background work
#[derive(Debug)]
pub enum SessionEvent {
    /// An exchange dispatched by `tab_id` finished, successfully or not
    ExchangeSettled {
        tab_id: String,
        outcome: ExchangeResult,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendPhase {
    Idle,
    Sending,
}

/// Owns one tab's [`RequestData`] exclusively.
///
/// Field edits only touch memory. Disk writes happen through [`persist`]
/// at lifecycle points: creation, send dispatch and settlement, switching
/// away from the tab, and shutdown.
///
/// [`persist`]: TabSession::persist
pub struct TabSession {
    data: RequestData,
    storage: StorageHandle,
    in_flight: usize,
    // Shared copy of the response body, rebuilt only when the response changes
    response_text: Arc<str>,
}

impl TabSession {
    /// Open a brand new tab and write its initial state
    pub fn new(storage: StorageHandle) -> Self {
        let session = TabSession {
            data: RequestData::new(),
            storage,
            in_flight: 0,
            response_text: Arc::from(""),
        };
        session.persist();
        session
    }

    /// Rebuild a tab from a persisted record.
    ///
    /// A record saved mid-send can never settle now, so its placeholders
    /// are dropped and the tab comes back as unsent.
    pub fn restore(mut data: RequestData, storage: StorageHandle) -> Self {
        if data.status.as_deref() == Some(STATUS_SENDING) {
            tracing::info!(tab = %data.id, "Discarding interrupted send");
            data.status = None;
            data.time = None;
            data.size = None;
            data.response_body = None;
            data.response_headers = None;
        }
        let mut session = TabSession {
            data,
            storage,
            in_flight: 0,
            response_text: Arc::from(""),
        };
        session.sync_response_text();
        session
    }

    pub fn id(&self) -> &str {
        &self.data.id
    }

    pub fn data(&self) -> &RequestData {
        &self.data
    }

    pub fn phase(&self) -> SendPhase {
        if self.in_flight > 0 {
            SendPhase::Sending
        } else {
            SendPhase::Idle
        }
    }

    // ========================
    // Request fields
    // ========================

    pub fn method(&self) -> HttpMethod {
        self.data.method
    }

    pub fn set_method(&mut self, method: HttpMethod) {
        self.data.method = method;
    }

    pub fn url(&self) -> &str {
        &self.data.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.data.url = url.into();
    }

    pub fn request_body(&self) -> &str {
        &self.data.request_body
    }

    pub fn set_request_body(&mut self, body: impl Into<String>) {
        self.data.request_body = body.into();
    }

    pub fn request_headers(&self) -> &str {
        &self.data.request_headers
    }

    pub fn set_request_headers(&mut self, text: impl Into<String>) {
        self.data.request_headers = text.into();
    }

    /// Mutable access to one editable text field, for the line editor
    pub fn field_mut(&mut self, field: EditableField) -> &mut String {
        match field {
            EditableField::Url => &mut self.data.url,
            EditableField::Body => &mut self.data.request_body,
            EditableField::Headers => &mut self.data.request_headers,
        }
    }

    pub fn field(&self, field: EditableField) -> &str {
        match field {
            EditableField::Url => &self.data.url,
            EditableField::Body => &self.data.request_body,
            EditableField::Headers => &self.data.request_headers,
        }
    }

    pub fn request_header_entries(&self) -> Vec<HeaderEntry> {
        headers::parse(&self.data.request_headers)
    }

    /// Replace the header text from table rows
    pub fn set_request_header_entries(&mut self, entries: &[HeaderEntry]) {
        self.data.request_headers = headers::serialize(entries);
    }

    pub fn insert_request_header(&mut self, index: usize, entry: HeaderEntry) {
        self.data.request_headers = headers::insert(&self.data.request_headers, index, entry);
    }

    pub fn remove_request_header(&mut self, index: usize) {
        self.data.request_headers = headers::remove(&self.data.request_headers, index);
    }

    // ========================
    // Response display
    // ========================

    pub fn status(&self) -> Option<&str> {
        self.data.status.as_deref()
    }

    pub fn time(&self) -> Option<&str> {
        self.data.time.as_deref()
    }

    pub fn size(&self) -> Option<&str> {
        self.data.size.as_deref()
    }

    pub fn response_body(&self) -> Option<&str> {
        self.data.response_body.as_deref()
    }

    /// The response body as a cheaply cloneable handle. The same allocation
    /// is returned until the response changes.
    pub fn response_text(&self) -> Arc<str> {
        Arc::clone(&self.response_text)
    }

    fn sync_response_text(&mut self) {
        self.response_text = Arc::from(self.data.response_body.as_deref().unwrap_or_default());
    }

    pub fn response_header_entries(&self) -> Vec<HeaderEntry> {
        self.data
            .response_headers
            .as_deref()
            .map(headers::parse)
            .unwrap_or_default()
    }

    // ========================
    // Sending
    // ========================

    /// Dispatch the tab's current request.
    ///
    /// The request is captured now; later edits do not affect it. The
    /// outcome arrives on `events` as [`SessionEvent::ExchangeSettled`] and
    /// must be handed back to [`apply_outcome`](Self::apply_outcome).
    /// Validation failures are applied immediately instead.
    pub fn send_request(
        &mut self,
        executor: &HttpExecutor,
        events: &mpsc::UnboundedSender<SessionEvent>,
    ) {
        let spec = ExchangeSpec::from_request(&self.data);

        match executor.validate(&spec) {
            Err(error) => {
                tracing::info!(tab = %self.data.id, error = %error, "Request rejected before dispatch");
                self.show_failure(&ExchangeFailure::immediate(error));
            }
            Ok(_) => {
                self.show_sending();
                self.in_flight += 1;

                let executor = executor.clone();
                let events = events.clone();
                let tab_id = self.data.id.clone();
                tokio::spawn(async move {
                    let outcome = executor.execute(spec).await;
                    if events
                        .send(SessionEvent::ExchangeSettled { tab_id, outcome })
                        .is_err()
                    {
                        tracing::debug!("Orchestrator gone; exchange result dropped");
                    }
                });
            }
        }

        self.sync_response_text();
        self.persist();
    }

    /// Record a settled exchange. The most recently applied outcome wins.
    pub fn apply_outcome(&mut self, outcome: ExchangeResult) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome {
            Ok(response) => {
                self.data.status = Some(response.status_code.to_string());
                self.data.time = Some(format!("{} ms", response.duration_ms));
                self.data.size = Some(format!("{} bytes", response.size_bytes));
                self.data.response_headers = Some(headers::serialize(&response.headers));
                self.data.response_body = Some(response.body);
            }
            Err(failure) => self.show_failure(&failure),
        }
        self.sync_response_text();
    }

    fn show_sending(&mut self) {
        self.data.status = Some(STATUS_SENDING.to_string());
        self.data.time = Some(PENDING_PLACEHOLDER.to_string());
        self.data.size = Some(PENDING_PLACEHOLDER.to_string());
        self.data.response_body = Some(String::new());
        self.data.response_headers = Some(String::new());
    }

    // Requests rejected before reaching the wire have no meaningful duration
    fn show_failure(&mut self, failure: &ExchangeFailure) {
        self.data.status = Some(STATUS_ERROR.to_string());
        self.data.time = Some(if failure.error.is_validation() {
            String::new()
        } else {
            format!("{} ms", failure.duration_ms)
        });
        self.data.size = Some(String::new());
        self.data.response_body = Some(format!("Error: {}", failure.error));
        self.data.response_headers = Some(String::new());
    }

    // ========================
    // Persistence
    // ========================

    /// Queue a snapshot of the current state for writing
    pub fn persist(&self) {
        self.storage.save(self.data.clone());
    }

    /// Remove the tab's persisted state. Consumes the session.
    pub fn close(self) {
        tracing::info!(tab = %self.data.id, "Closing tab");
        self.storage.delete(self.data.id);
    }
}

/// Text fields of a tab that the editor can change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditableField {
    Url,
    Body,
    Headers,
}
