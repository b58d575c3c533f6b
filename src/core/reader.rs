//! Borrowed, read-only bit stream over bytes owned by someone else.
//!
//! The usual way to decode a received datagram: no copy, no allocation, and
//! the borrow checker keeps the bytes alive for as long as the reader is.

use crate::config::DEFAULT_MAX_READ_BYTES;
use crate::core::cursor::{bits_to_bytes, bytes_to_bits, BitCursor};
use crate::core::io::BitRead;
use crate::error::{CodecError, Result};

/// Read-only view over a byte slice.
///
/// ```rust
/// use netbits::prelude::*;
///
/// let packet = [0b1000_0000u8];
/// let mut reader = BitReader::new(&packet);
/// assert!(reader.read_bit().unwrap());
/// assert_eq!(reader.payload_bits(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    cursor: BitCursor,
    read_limit: u32,
}

impl<'a> BitReader<'a> {
    /// Every byte of `data` counts as written
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            cursor: BitCursor::written(bytes_to_bits(data.len())),
            read_limit: DEFAULT_MAX_READ_BYTES,
        }
    }

    /// Only the first `bits` bits of `data` count as written, for payloads
    /// whose bit length travels out of band
    pub fn with_bit_len(data: &'a [u8], bits: usize) -> Result<Self> {
        let available = bytes_to_bits(data.len());
        if bits > available {
            return Err(CodecError::InsufficientPayload {
                requested: bits,
                available,
            });
        }
        Ok(Self {
            data: &data[..bits_to_bytes(bits)],
            cursor: BitCursor::written(bits),
            read_limit: DEFAULT_MAX_READ_BYTES,
        })
    }

    pub(crate) fn with_cursor(data: &'a [u8], cursor: BitCursor) -> Self {
        debug_assert!(bits_to_bytes(cursor.write_pos()) <= data.len());
        Self {
            data,
            cursor,
            read_limit: DEFAULT_MAX_READ_BYTES,
        }
    }

    /// Cap length-prefixed reads without an explicit limit at `bytes`
    pub fn with_read_limit(mut self, bytes: u32) -> Self {
        self.read_limit = bytes;
        self
    }

    /// The remaining unread bytes, starting at the byte holding the read
    /// cursor
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[(self.cursor.read_pos() >> 3).min(self.data.len())..]
    }

    pub fn into_inner(self) -> &'a [u8] {
        self.data
    }
}

impl BitRead for BitReader<'_> {
    #[inline]
    fn data(&self) -> &[u8] {
        self.data
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

impl<'a> From<&'a [u8]> for BitReader<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}
