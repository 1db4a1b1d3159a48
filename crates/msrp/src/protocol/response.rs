//! Session response representation.

use std::fmt;
use std::sync::Arc;

use crate::protocol::{BodySource, FieldMap, Request};

/// A parsed session response.
///
/// A response may carry a back-reference to the request it answers. The
/// reference is attached by the stream consumption loop for correlation only;
/// it is absent when the response is read in isolation, and ownership of the
/// request stays with whoever holds the other `Arc` handles.
pub struct Response {
    pub(crate) proto: String,
    pub(crate) transaction_id: String,
    pub(crate) status_code: u16,
    pub(crate) reason: String,
    pub(crate) fields: FieldMap,
    pub(crate) body: Option<Box<dyn BodySource>>,
    pub(crate) content_length: Option<u64>,
    pub(crate) close: bool,
    pub(crate) request: Option<Arc<Request>>,
}

impl Response {
    pub(crate) fn from_wire(proto: String, transaction_id: String, status_code: u16, reason: String, fields: FieldMap) -> Self {
        Self {
            proto,
            transaction_id,
            status_code,
            reason,
            fields,
            body: None,
            content_length: None,
            close: false,
            request: None,
        }
    }

    /// Protocol token from the status line, e.g. `MSRP`.
    pub fn proto(&self) -> &str {
        &self.proto
    }

    /// Transaction identifier, empty when the status-line layout carries none.
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    /// Three-digit status code, e.g. `200`.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Human-readable status phrase, possibly empty.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Composite status rendering, e.g. `200 OK`.
    pub fn status(&self) -> String {
        if self.reason.is_empty() {
            self.status_code.to_string()
        } else {
            format!("{} {}", self.status_code, self.reason)
        }
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldMap {
        &mut self.fields
    }

    /// Body byte count when known, `None` for unknown or streamed bodies.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Whether the connection should close after this message.
    pub fn close(&self) -> bool {
        self.close
    }

    pub fn set_close(&mut self, close: bool) {
        self.close = close;
    }

    /// The request this response answers, when the consumption loop attached
    /// one.
    pub fn request(&self) -> Option<&Request> {
        self.request.as_deref()
    }

    pub fn body_mut(&mut self) -> Option<&mut dyn BodySource> {
        self.body.as_mut().map(|body| &mut **body as &mut (dyn BodySource + '_))
    }

    /// Detaches the body, leaving the response without one.
    pub fn take_body(&mut self) -> Option<Box<dyn BodySource>> {
        self.body.take()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("proto", &self.proto)
            .field("transaction_id", &self.transaction_id)
            .field("status_code", &self.status_code)
            .field("reason", &self.reason)
            .field("fields", &self.fields)
            .field("content_length", &self.content_length)
            .field("close", &self.close)
            .field("has_body", &self.body.is_some())
            .field("correlated", &self.request.is_some())
            .finish()
    }
}
