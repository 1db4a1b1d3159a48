//! Session request representation.

use std::fmt;

use crate::protocol::{BodySource, FieldMap, PROTOCOL};

/// A parsed session request.
///
/// A request is created empty by the message reader once its start line
/// parses, then populated from the header block. The body, when one exists,
/// is a lazily consumed [`BodySource`]; the reader never drains it, so an
/// owner that wants the next message on the same stream must consume the body
/// first.
pub struct Request {
    pub(crate) proto: String,
    pub(crate) transaction_id: String,
    pub(crate) method: String,
    pub(crate) fields: FieldMap,
    pub(crate) body: Option<Box<dyn BodySource>>,
    pub(crate) content_length: Option<u64>,
    pub(crate) close: bool,
}

impl Request {
    /// Creates a locally originated request for `method` with an optional
    /// body.
    ///
    /// The content length is taken from the body's own length capability;
    /// sources without a known total leave it unset.
    pub fn new(method: impl Into<String>, body: Option<Box<dyn BodySource>>) -> Self {
        let content_length = body.as_ref().and_then(|body| body.total_len());
        Self {
            proto: PROTOCOL.to_owned(),
            transaction_id: String::new(),
            method: method.into(),
            fields: FieldMap::new(),
            body,
            content_length,
            close: false,
        }
    }

    pub(crate) fn from_wire(proto: String, transaction_id: String, method: String, fields: FieldMap) -> Self {
        Self { proto, transaction_id, method, fields, body: None, content_length: None, close: false }
    }

    /// Protocol token from the start line, e.g. `MSRP`.
    pub fn proto(&self) -> &str {
        &self.proto
    }

    /// Opaque token correlating this request with its eventual response.
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    /// Method token from the start line, e.g. `SEND`.
    pub fn method(&self) -> &str {
        &self.method
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

    pub fn body_mut(&mut self) -> Option<&mut dyn BodySource> {
        self.body.as_mut().map(|body| &mut **body as &mut (dyn BodySource + '_))
    }

    /// Detaches the body, leaving the request without one.
    pub fn take_body(&mut self) -> Option<Box<dyn BodySource>> {
        self.body.take()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("proto", &self.proto)
            .field("transaction_id", &self.transaction_id)
            .field("method", &self.method)
            .field("fields", &self.fields)
            .field("content_length", &self.content_length)
            .field("close", &self.close)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
