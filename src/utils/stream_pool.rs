//! # Stream Pool
//!
//! Recycles [`BitStream`]s for the one-stream-per-message pattern, so a busy
//! server does not pay for a fresh stream on every packet.
//!
//! Streams come back reset (cursors at zero) with their buffer kept. Streams
//! that spilled beyond [`MAX_POOLED_BYTES`] are dropped instead of recycled
//! so that one oversized message does not pin a large allocation forever.
//!
//! ## Usage
//! ```rust
//! use netbits::prelude::*;
//! use netbits::utils::stream_pool::StreamPool;
//!
//! let pool = StreamPool::new(8);
//! {
//!     let mut stream = pool.acquire();
//!     stream.write(42u32);
//!     assert_eq!(stream.written_bits(), 32);
//! } // returned to the pool here
//! assert_eq!(pool.available(), 8);
//! ```

use crate::core::buffer::BitStream;
use crate::core::io::BitWrite;
use crate::utils::metrics::global_metrics;
use std::sync::{Arc, Mutex};

/// Largest buffer, in bytes, a returned stream may hold and still be recycled
pub const MAX_POOLED_BYTES: usize = 4096;

const DEFAULT_POOL_SIZE: usize = 32;

/// A pooled stream that returns itself to the pool when dropped
pub struct PooledStream {
    stream: Option<BitStream>,
    pool: Arc<Mutex<Vec<BitStream>>>,
}

impl PooledStream {
    /// Take the stream out of the pool for good
    pub fn into_inner(mut self) -> BitStream {
        self.stream.take().unwrap_or_default()
    }
}

impl Drop for PooledStream {
    fn drop(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };
        if stream.capacity_bits() / 8 > MAX_POOLED_BYTES {
            return;
        }
        stream.reset();
        if let Ok(mut pool) = self.pool.lock() {
            pool.push(stream);
        }
    }
}

impl std::ops::Deref for PooledStream {
    type Target = BitStream;

    fn deref(&self) -> &Self::Target {
        // only `into_inner` and `drop` take the stream, both consume self
        self.stream.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl std::ops::DerefMut for PooledStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stream.as_mut().unwrap_or_else(|| unreachable!())
    }
}

/// Thread-safe pool of reusable streams
#[derive(Clone)]
pub struct StreamPool {
    pool: Arc<Mutex<Vec<BitStream>>>,
}

impl StreamPool {
    /// Create a pool holding `pool_size` ready streams
    pub fn new(pool_size: usize) -> Self {
        let pool = (0..pool_size).map(|_| BitStream::new()).collect();
        Self {
            pool: Arc::new(Mutex::new(pool)),
        }
    }

    /// Take a stream from the pool, or build a new one when it is empty
    pub fn acquire(&self) -> PooledStream {
        let recycled = self.pool.lock().ok().and_then(|mut pool| pool.pop());
        let stream = match recycled {
            Some(stream) => {
                global_metrics().pool_hit();
                stream
            }
            None => BitStream::new(),
        };

        PooledStream {
            stream: Some(stream),
            pool: Arc::clone(&self.pool),
        }
    }

    /// Number of streams waiting in the pool
    pub fn available(&self) -> usize {
        self.pool.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl Default for StreamPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::BitRead;
    use crate::core::primitive::PrimitiveWrite;

    #[test]
    fn test_stream_pool_basic() {
        let pool = StreamPool::new(4);
        assert_eq!(pool.available(), 4);

        let mut stream = pool.acquire();
        assert_eq!(pool.available(), 3);
        stream.write(7u16);
        assert_eq!(stream.as_bytes(), &[0, 7]);

        drop(stream);
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn test_returned_stream_is_reset() {
        let pool = StreamPool::new(1);
        {
            let mut stream = pool.acquire();
            stream.write(0xFFFF_FFFFu32);
        }
        let stream = pool.acquire();
        assert_eq!(stream.written_bits(), 0);
        assert_eq!(stream.read_pos(), 0);
    }

    #[test]
    fn test_empty_pool_allocates() {
        let pool = StreamPool::new(1);
        let _first = pool.acquire();
        let second = pool.acquire();
        assert_eq!(second.written_bits(), 0);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_oversized_stream_not_recycled() {
        let pool = StreamPool::new(1);
        {
            let mut stream = pool.acquire();
            stream.write_bytes(&vec![0u8; MAX_POOLED_BYTES + 1]);
        }
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_into_inner_leaves_pool() {
        let pool = StreamPool::new(1);
        let mut stream = pool.acquire().into_inner();
        stream.write(true);
        assert_eq!(pool.available(), 0);
        assert_eq!(stream.written_bits(), 1);
    }
}
