//! An asynchronous MSRP session message reader
//!
//! This crate turns the continuous, reassembled, ordered byte stream of a TCP
//! connection into discrete session-protocol messages: requests and responses
//! with a structured start line, a header field block, and an optional body.
//! It is built on top of tokio and handles partial reads, not-yet-arrived
//! data, end-of-stream, and malformed input without ever giving up on a
//! long-lived stream.
//!
//! TCP capture, out-of-order segment reassembly, and flow demultiplexing are
//! the job of an external collaborator that guarantees in-order, gap-free
//! byte delivery per connection; this crate consumes that stream through an
//! [`AsyncRead`](tokio::io::AsyncRead) and never inspects transport framing.
//!
//! # Features
//!
//! - Streaming message decoding over `tokio_util` framing
//! - Alternating request/response reading with transaction correlation
//! - Tolerant line reading (CRLF and bare LF) and MIME-style header folding
//! - Insertion-ordered, case-insensitive header field storage
//! - Per-line resynchronization after malformed frames
//! - Decoder reuse across connections through an explicit pool
//!
//! # Example
//!
//! ```no_run
//! use micro_msrp::dispatch::FlowDispatcher;
//! use micro_msrp::sink::LogSink;
//! use tracing::Level;
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     let dispatcher = FlowDispatcher::new(|| LogSink);
//!
//!     // for every per-connection byte stream announced by the reassembly
//!     // collaborator:
//!     let stream: &[u8] = b"MSRP d93kswow SEND\r\nTo-Path: msrp://a/1,tcp\r\n\r\n";
//!     let task = dispatcher.dispatch(stream);
//!
//!     task.await.expect("connection task panicked");
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`protocol`]: Message data model, header storage and error taxonomy
//! - [`codec`]: Start-line parsers, the message decoder, the decoder pool
//! - [`connection`]: Per-connection stream consumption loop
//! - [`sink`]: The consumer interface messages are forwarded to
//! - [`dispatch`]: One spawned task per announced connection
//!
//! # Error handling
//!
//! Clean end-of-stream is the normal termination of a connection task, not an
//! error. A stream that dies mid-message surfaces one
//! [`ParseError::UnexpectedEof`](protocol::ParseError) diagnostic. All other
//! parse failures are reported to the sink and the loop resynchronizes on the
//! next line; nothing in this crate is process-fatal.
//!
//! # Limitations
//!
//! - Body framing is externally bounded: the reader exposes bodies as lazily
//!   consumed byte sources but does not scan for boundary markers
//! - Maximum header block size: 8KB
//! - Maximum field lines per message: 64

pub mod codec;
pub mod connection;
pub mod dispatch;
pub mod protocol;
pub mod sink;

mod utils;
pub(crate) use utils::ensure;
