//! Flow dispatch adapter.
//!
//! The reassembly collaborator announces each new connection as an ordered,
//! gap-free byte stream. [`FlowDispatcher`] spawns one independent task per
//! stream, each running its own [`SessionConnection`] with its own sink; the
//! decoder pool is the only state shared across connections.

use std::fmt;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::codec::{DecodeOptions, DecoderPool};
use crate::connection::SessionConnection;
use crate::sink::MessageSink;

/// Spawns a stream consumption task for every connection handed to it.
///
/// # Example
///
/// ```
/// use micro_msrp::dispatch::FlowDispatcher;
/// use micro_msrp::sink::LogSink;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let dispatcher = FlowDispatcher::new(|| LogSink);
/// let wire: &[u8] = b"MSRP d93kswow SEND\r\nTo-Path: msrp://a/1,tcp\r\n\r\n";
/// dispatcher.dispatch(wire).await.unwrap();
/// # }
/// ```
pub struct FlowDispatcher<F> {
    make_sink: F,
    pool: Arc<DecoderPool>,
}

impl<F, S> FlowDispatcher<F>
where
    F: Fn() -> S,
    S: MessageSink + Send + 'static,
{
    pub fn new(make_sink: F) -> Self {
        Self::with_options(make_sink, DecodeOptions::default())
    }

    pub fn with_options(make_sink: F, options: DecodeOptions) -> Self {
        Self { make_sink, pool: Arc::new(DecoderPool::new(options)) }
    }

    pub fn pool(&self) -> &Arc<DecoderPool> {
        &self.pool
    }

    /// Starts consuming `reader` on its own task, immediately and
    /// independently of all other connections.
    pub fn dispatch<R>(&self, reader: R) -> JoinHandle<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut sink = (self.make_sink)();
        let connection = SessionConnection::from_pool(reader, &self.pool);
        tokio::spawn(async move {
            match connection.process(&mut sink).await {
                Ok(()) => debug!("connection finished"),
                Err(e) => error!(cause = %e, "connection failed"),
            }
        })
    }
}

impl<F> fmt::Debug for FlowDispatcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowDispatcher").field("pool", &self.pool).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::protocol::{ParseError, Request, Response};

    #[derive(Debug, Default)]
    struct SharedSink {
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl MessageSink for SharedSink {
        async fn on_request(&mut self, request: &Request) {
            self.seen.lock().unwrap().push(format!("request {}", request.transaction_id()));
        }

        async fn on_response(&mut self, response: &Response) {
            self.seen.lock().unwrap().push(format!("response {}", response.transaction_id()));
        }

        async fn on_diagnostic(&mut self, error: &ParseError) {
            self.seen.lock().unwrap().push(format!("diagnostic {error}"));
        }
    }

    #[tokio::test]
    async fn each_connection_runs_on_its_own_task() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = {
            let seen = Arc::clone(&seen);
            FlowDispatcher::new(move || SharedSink { seen: Arc::clone(&seen) })
        };

        let first = dispatcher.dispatch(&b"MSRP a1 SEND\r\n\r\nMSRP a1 200 OK\r\n\r\n"[..]);
        let second = dispatcher.dispatch(&b"MSRP b2 SEND\r\n\r\n"[..]);
        first.await.unwrap();
        second.await.unwrap();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, ["request a1", "request b2", "response a1"]);

        // both tasks handed their decoders back
        assert_eq!(dispatcher.pool().idle(), 2);
    }
}
