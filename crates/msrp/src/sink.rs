//! External consumer interface.
//!
//! The stream consumption loop hands every completed message, and every
//! non-fatal diagnostic, to a [`MessageSink`] in stream order. The crate
//! places no formatting requirements on implementations; [`LogSink`] is the
//! built-in consumer that mirrors messages to `tracing`.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::protocol::{ParseError, Request, Response};

/// Per-connection consumer of decoded traffic.
#[async_trait]
pub trait MessageSink {
    async fn on_request(&mut self, request: &Request);

    async fn on_response(&mut self, response: &Response);

    /// Called for every non-fatal decode failure. The connection keeps
    /// running afterwards.
    async fn on_diagnostic(&mut self, error: &ParseError);
}

/// Logs every message and diagnostic through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl MessageSink for LogSink {
    async fn on_request(&mut self, request: &Request) {
        info!(
            proto = %request.proto(),
            transaction_id = %request.transaction_id(),
            method = %request.method(),
            "request"
        );
        for (name, values) in request.fields().iter() {
            for value in values {
                info!("{name}: {value}");
            }
        }
    }

    async fn on_response(&mut self, response: &Response) {
        info!(
            proto = %response.proto(),
            transaction_id = %response.transaction_id(),
            status = %response.status(),
            "response"
        );
        for (name, values) in response.fields().iter() {
            for value in values {
                info!("{name}: {value}");
            }
        }
    }

    async fn on_diagnostic(&mut self, error: &ParseError) {
        warn!(cause = %error, "discarded malformed frame");
    }
}
