//! Write/read bit positions shared by owned and borrowed streams.
//!
//! Both positions name the next bit to be touched, counting from bit 0 (the
//! MSB of byte 0). With `write = 12` and `read = 2`, bits 0..12 are written
//! and bits 2..12 are the unread payload:
//!
//! ```text
//!  byte 0                          byte 1
//! | 0 | 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 | 9 |10 |11 |12 |13 |14 |15 |
//!         ^ read                                  ^ write
//! ```

/// Number of bytes needed to hold `bits` bits (partial bytes count).
#[inline]
pub const fn bits_to_bytes(bits: usize) -> usize {
    (bits + 7) >> 3
}

/// Number of bits in `bytes` bytes.
#[inline]
pub const fn bytes_to_bits(bytes: usize) -> usize {
    bytes << 3
}

/// Round a bit position up to the next byte boundary.
#[inline]
pub const fn align_up(bits: usize) -> usize {
    (bits + 7) & !7
}

/// Independent write and read positions, in bits.
///
/// Keeps `read <= write`; capacity is the owner's business.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitCursor {
    write: usize,
    read: usize,
}

impl BitCursor {
    /// Both cursors at bit 0
    pub const fn new() -> Self {
        Self { write: 0, read: 0 }
    }

    /// A cursor over `bits` already-written bits, nothing read yet
    pub const fn written(bits: usize) -> Self {
        Self {
            write: bits,
            read: 0,
        }
    }

    #[inline]
    pub const fn write_pos(&self) -> usize {
        self.write
    }

    #[inline]
    pub const fn read_pos(&self) -> usize {
        self.read
    }

    /// Unread, already-written bits
    #[inline]
    pub const fn payload(&self) -> usize {
        self.write - self.read
    }

    /// Bytes touched by the written bits
    #[inline]
    pub const fn written_bytes(&self) -> usize {
        bits_to_bytes(self.write)
    }

    pub fn reset(&mut self) {
        self.write = 0;
        self.read = 0;
    }

    /// Rewind the write position. The read position follows so that it never
    /// points past the written region.
    pub fn reset_write(&mut self) {
        self.write = 0;
        self.read = 0;
    }

    pub fn reset_read(&mut self) {
        self.read = 0;
    }

    #[inline]
    pub(crate) fn advance_write(&mut self, bits: usize) {
        self.write += bits;
    }

    #[inline]
    pub(crate) fn advance_read(&mut self, bits: usize) {
        debug_assert!(self.read + bits <= self.write);
        self.read += bits;
    }

    /// Move the write position to the next byte boundary.
    ///
    /// Returns the number of padding bits skipped.
    pub(crate) fn align_write(&mut self) -> usize {
        let aligned = align_up(self.write);
        let skipped = aligned - self.write;
        self.write = aligned;
        skipped
    }

    /// Move the read position to the next byte boundary, bounded by the
    /// write position.
    pub(crate) fn align_read(&mut self) {
        self.read = align_up(self.read).min(self.write);
    }

    #[inline]
    pub const fn is_write_aligned(&self) -> bool {
        self.write & 7 == 0
    }

    #[inline]
    pub const fn is_read_aligned(&self) -> bool {
        self.read & 7 == 0
    }
}
