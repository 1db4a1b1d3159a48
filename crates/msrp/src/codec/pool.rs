//! Decoder reuse pool.
//!
//! An explicit object owned by whoever dispatches connections, not
//! process-wide state. The free list is behind a mutex that is held only for
//! the push or pop itself, so acquisition is atomic and unrelated connections
//! never serialize on each other's parsing. Pooling is transparent: a
//! released decoder is reset before it can be observed again.

use std::sync::{Mutex, PoisonError};

use crate::codec::start_line::DecodeOptions;
use crate::codec::MessageDecoder;

/// A thread-safe free list of [`MessageDecoder`]s sharing one configuration.
#[derive(Debug)]
pub struct DecoderPool {
    options: DecodeOptions,
    free: Mutex<Vec<MessageDecoder>>,
}

impl DecoderPool {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options, free: Mutex::new(Vec::new()) }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Takes a decoder from the free list, or builds a fresh one from the
    /// pool's options.
    pub fn acquire(&self) -> MessageDecoder {
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        free.pop().unwrap_or_else(|| MessageDecoder::new(self.options.clone()))
    }

    /// Resets `decoder` and returns it to the free list.
    pub fn release(&self, mut decoder: MessageDecoder) {
        decoder.reset();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        free.push(decoder);
    }

    /// Number of decoders currently idle in the pool.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for DecoderPool {
    fn default() -> Self {
        Self::new(DecodeOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Expect;

    #[test]
    fn acquire_on_empty_pool_builds_fresh_decoder() {
        let pool = DecoderPool::default();
        assert_eq!(pool.idle(), 0);

        let decoder = pool.acquire();
        assert_eq!(decoder.expect(), Expect::Request);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn released_decoder_comes_back_reset() {
        let pool = DecoderPool::default();
        let mut decoder = pool.acquire();
        decoder.expect_response();

        pool.release(decoder);
        assert_eq!(pool.idle(), 1);

        let recycled = pool.acquire();
        assert_eq!(recycled.expect(), Expect::Request);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn acquire_is_exclusive_across_threads() {
        use std::sync::Arc;

        let pool = Arc::new(DecoderPool::default());
        pool.release(MessageDecoder::default());
        pool.release(MessageDecoder::default());

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || pool.acquire())
            })
            .collect();
        for handle in handles {
            drop(handle.join().unwrap());
        }

        // both pooled decoders were handed out, never the same one twice
        assert_eq!(pool.idle(), 0);
    }
}
