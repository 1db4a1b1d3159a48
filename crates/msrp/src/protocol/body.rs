//! Lazily consumed message body sources.
//!
//! A body is never read eagerly by the message reader; it is exposed to the
//! owner of the message as an [`AsyncRead`] whose end is bounded externally,
//! either by a known total length or by the boundary supplied by the
//! reassembly collaborator. Dropping the source closes it.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use tokio::io::{AsyncRead, ReadBuf};

/// A closable, lazily consumed byte source backing a message body.
///
/// The single capability on top of [`AsyncRead`] is reporting a known total
/// length. Sources that stream without a known end simply keep the default
/// `None`.
pub trait BodySource: AsyncRead + Send + Sync + Unpin {
    /// Total body length in bytes, when the source knows it up front.
    fn total_len(&self) -> Option<u64> {
        None
    }
}

/// An in-memory body with a known total length.
#[derive(Debug, Clone)]
pub struct FixedBody {
    data: Bytes,
    total: u64,
}

impl FixedBody {
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self { total: data.len() as u64, data }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }
}

impl AsyncRead for FixedBody {
    fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.data.has_remaining() {
            let take = this.data.remaining().min(buf.remaining());
            buf.put_slice(&this.data[..take]);
            this.data.advance(take);
        }
        Poll::Ready(Ok(()))
    }
}

impl BodySource for FixedBody {
    fn total_len(&self) -> Option<u64> {
        Some(self.total)
    }
}
