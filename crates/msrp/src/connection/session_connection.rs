use std::mem;
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::{debug, error};

use crate::codec::{DecodeItem, DecodeOptions, DecoderPool, MessageDecoder};
use crate::protocol::{ParseError, Request, SessionMessage};
use crate::sink::MessageSink;

const INITIAL_READ_BUFFER: usize = 8 * 1024;

/// Reads one connection's byte stream and forwards completed messages to a
/// sink.
///
/// The loop alternates between expecting a request and expecting the response
/// that answers it, attaching the correlated request to each response.
/// Diagnostics are forwarded as they occur: while awaiting a request the loop
/// simply keeps looking for one on the following lines, while a failed
/// response read abandons that exchange and resynchronizes on the next
/// request.
///
/// The byte stream is owned exclusively by this connection; suspension while
/// waiting for bytes never blocks other connections, and the loop never
/// blocks past a clean end-of-stream.
///
/// # Type Parameters
///
/// * `R`: The reassembled byte stream supplied by the collaborator
pub struct SessionConnection<R> {
    framed_read: FramedRead<R, MessageDecoder>,
    pool: Option<Arc<DecoderPool>>,
}

impl<R> SessionConnection<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self::with_decoder(reader, MessageDecoder::default(), None)
    }

    pub fn with_options(reader: R, options: DecodeOptions) -> Self {
        Self::with_decoder(reader, MessageDecoder::new(options), None)
    }

    /// Builds a connection whose decoder is borrowed from `pool` and handed
    /// back once the stream ends.
    pub fn from_pool(reader: R, pool: &Arc<DecoderPool>) -> Self {
        Self::with_decoder(reader, pool.acquire(), Some(Arc::clone(pool)))
    }

    fn with_decoder(reader: R, decoder: MessageDecoder, pool: Option<Arc<DecoderPool>>) -> Self {
        Self { framed_read: FramedRead::with_capacity(reader, decoder, INITIAL_READ_BUFFER), pool }
    }

    /// Consumes the stream until it ends.
    ///
    /// Returns `Ok(())` on clean end-of-stream and after a mid-message
    /// truncation (which the sink has already seen as a diagnostic); only IO
    /// failure surfaces as an error.
    pub async fn process<S>(mut self, sink: &mut S) -> Result<(), ParseError>
    where
        S: MessageSink + Send,
    {
        let result = self.run(sink).await;
        if let Some(pool) = self.pool.take() {
            pool.release(mem::take(self.framed_read.decoder_mut()));
        }
        result
    }

    async fn run<S>(&mut self, sink: &mut S) -> Result<(), ParseError>
    where
        S: MessageSink + Send,
    {
        'exchange: loop {
            self.framed_read.decoder_mut().expect_request();
            let Some(request) = self.next_request(sink).await? else {
                debug!("stream ended, closing connection");
                return Ok(());
            };
            sink.on_request(&request).await;
            let mut request = Arc::new(request);

            self.framed_read.decoder_mut().expect_response();
            let mut response = loop {
                match self.next_item().await? {
                    None => {
                        debug!(transaction_id = %request.transaction_id(), "stream ended awaiting response");
                        return Ok(());
                    }
                    Some(DecodeItem::Message(SessionMessage::Response(response))) => break response,
                    Some(DecodeItem::Message(SessionMessage::Request(next))) => {
                        // the decoder expects a status line here, so this only
                        // happens if that contract breaks; forward the message
                        // and wait for its response instead of losing it
                        sink.on_request(&next).await;
                        request = Arc::new(next);
                    }
                    Some(DecodeItem::Diagnostic(error)) => {
                        // give up on this exchange's response and
                        // resynchronize on the next request
                        sink.on_diagnostic(&error).await;
                        continue 'exchange;
                    }
                }
            };
            response.request = Some(Arc::clone(&request));
            sink.on_response(&response).await;
        }
    }

    /// Polls until a request decodes, reporting diagnostics to the sink along
    /// the way.
    async fn next_request<S>(&mut self, sink: &mut S) -> Result<Option<Request>, ParseError>
    where
        S: MessageSink + Send,
    {
        loop {
            match self.next_item().await? {
                None => return Ok(None),
                Some(DecodeItem::Message(SessionMessage::Request(request))) => return Ok(Some(request)),
                Some(DecodeItem::Message(SessionMessage::Response(response))) => {
                    // uncorrelated, but forward it rather than drop a decoded
                    // message on the floor
                    sink.on_response(&response).await;
                }
                Some(DecodeItem::Diagnostic(error)) => sink.on_diagnostic(&error).await,
            }
        }
    }

    async fn next_item(&mut self) -> Result<Option<DecodeItem>, ParseError> {
        match self.framed_read.next().await {
            None => Ok(None),
            Some(Ok(item)) => Ok(Some(item)),
            Some(Err(error)) => {
                error!(cause = %error, "connection stream failed");
                Err(error)
            }
        }
    }
}

impl<R> std::fmt::Debug for SessionConnection<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConnection").field("pooled", &self.pool.is_some()).finish()
    }
}
