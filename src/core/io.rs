//! Read and write sides of a bit stream.
//!
//! [`BitRead`] is implemented by both the owned [`BitStream`] and the borrowed
//! [`BitReader`]; [`BitWrite`] only by the owned stream, so a view over a
//! received packet cannot be written to or grown.
//!
//! Implementors provide buffer and cursor access; every operation here is a
//! provided method built on [`crate::core::bits`].
//!
//! [`BitStream`]: crate::core::buffer::BitStream
//! [`BitReader`]: crate::core::reader::BitReader

use crate::config::DEFAULT_MAX_READ_BYTES;
use crate::core::bits;
use crate::core::cursor::{bits_to_bytes, bytes_to_bits, BitCursor};
use crate::error::{constants, CodecError, Result};
use crate::utils::metrics::global_metrics;
use tracing::debug;

/// Read side of a bit stream
pub trait BitRead {
    /// Bytes backing the written region
    fn data(&self) -> &[u8];

    fn cursor(&self) -> &BitCursor;

    fn cursor_mut(&mut self) -> &mut BitCursor;

    /// Unread, already-written bits
    #[inline]
    fn payload_bits(&self) -> usize {
        self.cursor().payload()
    }

    #[inline]
    fn read_pos(&self) -> usize {
        self.cursor().read_pos()
    }

    #[inline]
    fn written_bits(&self) -> usize {
        self.cursor().write_pos()
    }

    /// Bytes needed to hold every written bit
    #[inline]
    fn written_bytes(&self) -> usize {
        self.cursor().written_bytes()
    }

    fn is_consumed(&self) -> bool {
        self.payload_bits() == 0
    }

    /// Panics unless every written bit has been read.
    ///
    /// Call at the end of decoding a message: leftover payload means the
    /// reads did not mirror the writes.
    fn assert_consumed(&self) {
        assert!(
            self.is_consumed(),
            "{} ({} bits left)",
            constants::ERR_STREAM_NOT_CONSUMED,
            self.payload_bits()
        );
    }

    fn reset_read(&mut self) {
        self.cursor_mut().reset_read();
    }

    /// Default cap, in bytes, for length-prefixed reads that take no explicit
    /// limit
    fn read_limit(&self) -> u32 {
        DEFAULT_MAX_READ_BYTES
    }

    /// Fail unless at least `bits` bits remain unread
    fn require(&self, bits: usize) -> Result<()> {
        let available = self.payload_bits();
        if bits > available {
            global_metrics().decode_error();
            debug!(
                requested = bits,
                available,
                read_pos = self.read_pos(),
                "Read past end of payload"
            );
            return Err(CodecError::InsufficientPayload {
                requested: bits,
                available,
            });
        }
        Ok(())
    }

    /// Advance the read cursor without copying, e.g. to ignore a field
    fn skip_read(&mut self, bits: usize) -> Result<()> {
        self.require(bits)?;
        self.cursor_mut().advance_read(bits);
        Ok(())
    }

    fn skip_read_bytes(&mut self, bytes: usize) -> Result<()> {
        self.skip_read(bytes_to_bits(bytes))
    }

    /// Move the read cursor to the next byte boundary
    fn align_read(&mut self) {
        self.cursor_mut().align_read();
    }

    /// Copy `bits` bits into `dst`.
    ///
    /// With `right_aligned`, a trailing partial byte lands in the low bits of
    /// its byte; otherwise in the high bits. `dst` must hold at least
    /// `ceil(bits / 8)` bytes.
    fn read_bits(&mut self, dst: &mut [u8], bits: usize, right_aligned: bool) -> Result<()> {
        assert!(
            dst.len() >= bits_to_bytes(bits),
            "destination holds {} bytes, {} bits requested",
            dst.len(),
            bits
        );
        if bits == 0 {
            return Ok(());
        }
        self.require(bits)?;
        let pos = self.read_pos();
        bits::copy_out(self.data(), pos, dst, bits, right_aligned);
        self.cursor_mut().advance_read(bits);
        Ok(())
    }

    /// Fill `dst` with whole bytes from the current (possibly unaligned)
    /// position
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        let bits = bytes_to_bits(dst.len());
        self.read_bits(dst, bits, true)
    }

    /// Single-bit fast path
    #[inline]
    fn read_bit(&mut self) -> Result<bool> {
        self.require(1)?;
        let pos = self.read_pos();
        let bit = bits::get_bit(self.data(), pos);
        self.cursor_mut().advance_read(1);
        Ok(bit)
    }

    /// Byte-aligned fast path; panics when the read cursor is unaligned
    fn read_aligned_u8(&mut self) -> Result<u8> {
        assert!(self.cursor().is_read_aligned(), "{}", constants::ERR_UNALIGNED_READ);
        self.require(8)?;
        let idx = self.read_pos() >> 3;
        let value = self.data()[idx];
        self.cursor_mut().advance_read(8);
        Ok(value)
    }

    /// Byte-aligned fast path, network byte order
    fn read_aligned_u16(&mut self) -> Result<u16> {
        assert!(self.cursor().is_read_aligned(), "{}", constants::ERR_UNALIGNED_READ);
        self.require(16)?;
        let idx = self.read_pos() >> 3;
        let data = self.data();
        let value = u16::from_be_bytes([data[idx], data[idx + 1]]);
        self.cursor_mut().advance_read(16);
        Ok(value)
    }

    /// Byte-aligned fast path, network byte order
    fn read_aligned_u32(&mut self) -> Result<u32> {
        assert!(self.cursor().is_read_aligned(), "{}", constants::ERR_UNALIGNED_READ);
        self.require(32)?;
        let idx = self.read_pos() >> 3;
        let data = self.data();
        let value = u32::from_be_bytes([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]);
        self.cursor_mut().advance_read(32);
        Ok(value)
    }

    /// Align the read cursor, then block-copy `dst.len()` bytes.
    ///
    /// On failure the cursor is left where it was, alignment included.
    fn read_aligned_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        if dst.is_empty() {
            return Ok(());
        }
        let saved = *self.cursor();
        self.align_read();
        if let Err(e) = self.require(bytes_to_bits(dst.len())) {
            *self.cursor_mut() = saved;
            return Err(e);
        }
        let idx = self.read_pos() >> 3;
        dst.copy_from_slice(&self.data()[idx..idx + dst.len()]);
        self.cursor_mut().advance_read(bytes_to_bits(dst.len()));
        Ok(())
    }
}

/// Run a multi-field read, rewinding the read cursor if any part of it fails
pub(crate) fn rewind_on_err<R, T, F>(r: &mut R, read: F) -> Result<T>
where
    R: BitRead + ?Sized,
    F: FnOnce(&mut R) -> Result<T>,
{
    let saved = *r.cursor();
    let result = read(r);
    if result.is_err() {
        *r.cursor_mut() = saved;
    }
    result
}

/// Write side of a bit stream.
///
/// Writing never fails for lack of space: the implementor grows its buffer in
/// [`BitWrite::ensure_capacity`].
pub trait BitWrite: BitRead {
    /// Guarantee room for `additional_bits` more bits after the write cursor.
    ///
    /// Panics when `additional_bits` is zero.
    fn ensure_capacity(&mut self, additional_bits: usize);

    /// The whole allocated buffer, including bytes past the write cursor
    fn buffer_mut(&mut self) -> &mut [u8];

    /// Rewind both cursors; the buffer is kept for reuse
    fn reset(&mut self) {
        self.cursor_mut().reset();
    }

    fn reset_write(&mut self) {
        self.cursor_mut().reset_write();
    }

    /// Move the write cursor to the next byte boundary, zero-filling the gap
    fn align_write(&mut self) {
        let pos = self.written_bits();
        let gap = crate::core::cursor::align_up(pos) - pos;
        if gap > 0 {
            self.ensure_capacity(gap);
            bits::copy_in(self.buffer_mut(), pos, &[0], gap, true);
            self.cursor_mut().align_write();
        }
    }

    /// Copy `bits` bits from `src` in after the write cursor.
    ///
    /// With `right_aligned`, a trailing partial byte of `src` is taken from its
    /// low bits; otherwise from its high bits. `src` must hold at least
    /// `ceil(bits / 8)` bytes.
    fn write_bits(&mut self, src: &[u8], bits: usize, right_aligned: bool) {
        assert!(
            src.len() >= bits_to_bytes(bits),
            "source holds {} bytes, {} bits requested",
            src.len(),
            bits
        );
        if bits == 0 {
            return;
        }
        self.ensure_capacity(bits);
        let pos = self.written_bits();
        bits::copy_in(self.buffer_mut(), pos, src, bits, right_aligned);
        self.cursor_mut().advance_write(bits);
    }

    /// Whole bytes at the current (possibly unaligned) position
    fn write_bytes(&mut self, src: &[u8]) {
        self.write_bits(src, bytes_to_bits(src.len()), true);
    }

    /// Single-bit fast path
    #[inline]
    fn write_bit(&mut self, bit: bool) {
        self.ensure_capacity(1);
        let pos = self.written_bits();
        bits::put_bit(self.buffer_mut(), pos, bit);
        self.cursor_mut().advance_write(1);
    }

    #[inline]
    fn write_bit_zero(&mut self) {
        self.write_bit(false);
    }

    #[inline]
    fn write_bit_one(&mut self) {
        self.write_bit(true);
    }

    /// Byte-aligned fast path; panics when the write cursor is unaligned
    fn write_aligned_u8(&mut self, value: u8) {
        assert!(self.cursor().is_write_aligned(), "{}", constants::ERR_UNALIGNED_WRITE);
        self.ensure_capacity(8);
        let idx = self.written_bits() >> 3;
        self.buffer_mut()[idx] = value;
        self.cursor_mut().advance_write(8);
    }

    /// Byte-aligned fast path, network byte order
    fn write_aligned_u16(&mut self, value: u16) {
        assert!(self.cursor().is_write_aligned(), "{}", constants::ERR_UNALIGNED_WRITE);
        self.ensure_capacity(16);
        let idx = self.written_bits() >> 3;
        self.buffer_mut()[idx..idx + 2].copy_from_slice(&value.to_be_bytes());
        self.cursor_mut().advance_write(16);
    }

    /// Byte-aligned fast path, network byte order
    fn write_aligned_u32(&mut self, value: u32) {
        assert!(self.cursor().is_write_aligned(), "{}", constants::ERR_UNALIGNED_WRITE);
        self.ensure_capacity(32);
        let idx = self.written_bits() >> 3;
        self.buffer_mut()[idx..idx + 4].copy_from_slice(&value.to_be_bytes());
        self.cursor_mut().advance_write(32);
    }

    /// Align the write cursor, then block-copy `src`
    fn write_aligned_bytes(&mut self, src: &[u8]) {
        if src.is_empty() {
            return;
        }
        self.align_write();
        self.ensure_capacity(bytes_to_bits(src.len()));
        let idx = self.written_bits() >> 3;
        self.buffer_mut()[idx..idx + src.len()].copy_from_slice(src);
        self.cursor_mut().advance_write(bytes_to_bits(src.len()));
    }

    /// Append zero bits until at least `bytes` bytes are written
    fn pad_zeros_up_to(&mut self, bytes: usize) {
        let target = bytes_to_bits(bytes);
        let pos = self.written_bits();
        if target <= pos {
            return;
        }
        let zeros = target - pos;
        self.ensure_capacity(zeros);
        let lead = (8 - (pos & 7)) & 7;
        if lead > 0 {
            bits::copy_in(self.buffer_mut(), pos, &[0], lead.min(zeros), true);
        }
        // remaining bits start on a byte boundary
        let start = bits_to_bytes(pos);
        let end = bits_to_bytes(target);
        self.buffer_mut()[start..end].fill(0);
        self.cursor_mut().advance_write(zeros);
    }

    /// Move `bits` unread bits from `source` into this stream, advancing the
    /// source's read cursor
    fn write_stream<R: BitRead + ?Sized>(&mut self, source: &mut R, bits: usize) -> Result<()> {
        source.require(bits)?;
        if bits == 0 {
            return Ok(());
        }
        let mut scratch = vec![0u8; bits_to_bytes(bits)];
        source.read_bits(&mut scratch, bits, false)?;
        self.write_bits(&scratch, bits, false);
        Ok(())
    }

    /// Move the whole unread payload of `source` into this stream
    fn write_stream_payload<R: BitRead + ?Sized>(&mut self, source: &mut R) -> Result<()> {
        let bits = source.payload_bits();
        self.write_stream(source, bits)
    }
}
