//! Message sum type produced by the decoder.

use crate::protocol::{Request, Response};

/// One complete message read from a connection, either direction.
#[derive(Debug)]
pub enum SessionMessage {
    Request(Request),
    Response(Response),
}

impl SessionMessage {
    #[inline]
    pub fn is_request(&self) -> bool {
        matches!(self, SessionMessage::Request(_))
    }

    #[inline]
    pub fn is_response(&self) -> bool {
        matches!(self, SessionMessage::Response(_))
    }

    /// Transaction identifier carried by either message kind.
    pub fn transaction_id(&self) -> &str {
        match self {
            SessionMessage::Request(request) => request.transaction_id(),
            SessionMessage::Response(response) => response.transaction_id(),
        }
    }

    pub fn into_request(self) -> Option<Request> {
        match self {
            SessionMessage::Request(request) => Some(request),
            SessionMessage::Response(_) => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            SessionMessage::Request(_) => None,
            SessionMessage::Response(response) => Some(response),
        }
    }
}
