//! Owned, growable bit stream.
//!
//! Small messages live entirely in an inline buffer of [`INLINE_BYTES`] bytes
//! and never touch the heap. The first write that does not fit spills the
//! content to a heap allocation, which the stream keeps from then on.

use crate::config::{StreamConfig, DEFAULT_MAX_READ_BYTES};
use crate::core::cursor::{bits_to_bytes, bytes_to_bits, BitCursor};
use crate::core::io::{BitRead, BitWrite};
use crate::core::reader::BitReader;
use crate::error::constants;
use crate::utils::metrics::global_metrics;
use bytes::Bytes;
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Inline storage threshold in bytes
pub const INLINE_BYTES: usize = 256;

type Storage = SmallVec<[u8; INLINE_BYTES]>;

/// An owned bit stream, readable and writable.
///
/// Writes grow the buffer on demand; reads consume the unread payload written
/// so far. Use one stream per outgoing message, or [`BitStream::from_slice`]
/// to decode a copy of received bytes.
///
/// ```rust
/// use netbits::prelude::*;
///
/// let mut stream = BitStream::new();
/// stream.write(true);
/// stream.write(0x1234u16);
/// assert_eq!(stream.written_bits(), 17);
///
/// assert!(stream.read::<bool>().unwrap());
/// assert_eq!(stream.read::<u16>().unwrap(), 0x1234);
/// stream.assert_consumed();
/// ```
#[derive(Debug, Clone)]
pub struct BitStream {
    buf: Storage,
    cursor: BitCursor,
    read_limit: u32,
}

impl BitStream {
    /// Empty stream backed by the inline buffer
    pub fn new() -> Self {
        global_metrics().stream_created();
        Self {
            buf: SmallVec::from_buf([0u8; INLINE_BYTES]),
            cursor: BitCursor::new(),
            read_limit: DEFAULT_MAX_READ_BYTES,
        }
    }

    /// Empty stream with room for at least `bytes` bytes.
    ///
    /// Only worth calling for messages known to exceed the inline buffer.
    pub fn with_capacity(bytes: usize) -> Self {
        if bytes <= INLINE_BYTES {
            return Self::new();
        }
        global_metrics().stream_created();
        Self {
            buf: SmallVec::from_elem(0u8, bytes),
            cursor: BitCursor::new(),
            read_limit: DEFAULT_MAX_READ_BYTES,
        }
    }

    /// Reserves `reserve_bytes` and caps length-prefixed reads at
    /// `max_read_bytes`
    pub fn from_config(config: &StreamConfig) -> Self {
        Self::with_capacity(config.reserve_bytes).with_read_limit(config.max_read_bytes)
    }

    /// Cap, in bytes, for [`MiniRead::read_aligned_bytes_limited`]
    ///
    /// [`MiniRead::read_aligned_bytes_limited`]: crate::compression::mini::MiniRead::read_aligned_bytes_limited
    pub fn with_read_limit(mut self, bytes: u32) -> Self {
        self.read_limit = bytes;
        self
    }

    /// Deep copy of `data`; every byte counts as written and unread.
    ///
    /// To decode without copying use [`BitReader::new`] instead.
    pub fn from_slice(data: &[u8]) -> Self {
        global_metrics().stream_created();
        let mut buf = Storage::new();
        buf.extend_from_slice(data);
        if buf.len() < INLINE_BYTES && !buf.spilled() {
            buf.resize(INLINE_BYTES, 0);
        }
        Self {
            buf,
            cursor: BitCursor::written(bytes_to_bits(data.len())),
            read_limit: DEFAULT_MAX_READ_BYTES,
        }
    }

    /// Allocated capacity in bits
    #[inline]
    pub fn capacity_bits(&self) -> usize {
        bytes_to_bits(self.buf.len())
    }

    /// Whether the content has moved from the inline buffer to the heap
    #[inline]
    pub fn is_spilled(&self) -> bool {
        self.buf.spilled()
    }

    /// The written bytes; a trailing partial byte has its unused low bits zero
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.cursor.written_bytes()]
    }

    /// Copy of the written bytes
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Hand the written region to the transport layer
    pub fn into_bytes(self) -> Bytes {
        let len = self.cursor.written_bytes();
        global_metrics().bytes_encoded(len as u64);
        if self.buf.spilled() {
            let mut vec = self.buf.into_vec();
            vec.truncate(len);
            Bytes::from(vec)
        } else {
            Bytes::copy_from_slice(&self.buf[..len])
        }
    }

    /// Borrowed read-only view over the written region, starting at bit 0.
    ///
    /// Reading through the view does not move this stream's read cursor. The
    /// view inherits the stream's read limit.
    pub fn reader(&self) -> BitReader<'_> {
        BitReader::with_cursor(self.as_bytes(), BitCursor::written(self.cursor.write_pos()))
            .with_read_limit(self.read_limit)
    }
}

impl Default for BitStream {
    fn default() -> Self {
        Self::new()
    }
}

impl BitRead for BitStream {
    #[inline]
    fn data(&self) -> &[u8] {
        &self.buf[..self.cursor.written_bytes()]
    }

    #[inline]
    fn cursor(&self) -> &BitCursor {
        &self.cursor
    }

    #[inline]
    fn cursor_mut(&mut self) -> &mut BitCursor {
        &mut self.cursor
    }

    #[inline]
    fn read_limit(&self) -> u32 {
        self.read_limit
    }
}

impl BitWrite for BitStream {
    fn ensure_capacity(&mut self, additional_bits: usize) {
        assert!(additional_bits > 0, "{}", constants::ERR_ZERO_GROWTH);

        let required = self.cursor.write_pos() + additional_bits;
        if required <= self.capacity_bits() {
            return;
        }

        let old_len = self.buf.len();
        let new_len = bits_to_bytes(required) * 2;
        let was_spilled = self.buf.spilled();
        self.buf.resize(new_len, 0);

        let metrics = global_metrics();
        metrics.reallocation();
        if !was_spilled && self.buf.spilled() {
            metrics.heap_spill();
            debug!(from = old_len, to = new_len, "Stream buffer spilled to heap");
        } else {
            trace!(from = old_len, to = new_len, "Stream buffer grown");
        }
    }

    #[inline]
    fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl From<&[u8]> for BitStream {
    fn from(data: &[u8]) -> Self {
        Self::from_slice(data)
    }
}
