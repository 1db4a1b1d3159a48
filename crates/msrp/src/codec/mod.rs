//! Wire decoding for the session protocol.
//!
//! This module turns an ordered, gap-free byte stream into discrete messages:
//!
//! - [`start_line`]: the two start-line parsers and their [`DecodeOptions`]
//! - [`MessageDecoder`]: reads one start line plus header block per message,
//!   driven through `tokio_util::codec::FramedRead`; each frame is a
//!   [`DecodeItem`] so parse failures travel in-band as diagnostics
//! - [`DecoderPool`]: explicit decoder reuse across connections
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_msrp::codec::MessageDecoder;
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = MessageDecoder::default();
//! let mut buffer = BytesMut::from("MSRP d93kswow SEND\r\nTo-Path: msrp://a/1,tcp\r\n\r\n");
//!
//! let item = decoder.decode(&mut buffer).unwrap().unwrap();
//! let message = item.into_message().unwrap();
//! assert_eq!(message.transaction_id(), "d93kswow");
//! ```

pub mod start_line;
pub use start_line::DecodeOptions;
pub use start_line::StatusLineLayout;

mod message_decoder;
pub use message_decoder::DecodeItem;
pub use message_decoder::Expect;
pub use message_decoder::MessageDecoder;

mod pool;
pub use pool::DecoderPool;
