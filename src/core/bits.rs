//! Raw bit copies between a packed buffer and caller byte arrays.
//!
//! Inside a stream, bits are packed left-aligned and MSB-first with no gaps.
//! Caller-facing arrays hold whole bytes followed, when the bit count is not a
//! multiple of 8, by one partial byte. With `right_aligned` the partial byte's
//! bits sit in its low end (as if counting from bit 0 of a fresh value), which
//! is what user data wants. Without it they sit in the high end, which is what
//! stream-to-stream copies want.
//!
//! Callers guarantee the buffers are large enough; every index here is
//! bounds-checked by slice indexing.

/// Mask selecting the top `bits` bits of a byte (`bits` in 1..=8).
#[inline]
const fn high_mask(bits: usize) -> u8 {
    (0xFF00u16 >> bits) as u8
}

/// Copy `bits` bits from `src` into `buf`, starting at bit `pos` of `buf`.
///
/// Bits of `buf` at and after `pos` inside the first touched byte are
/// overwritten, so stale content left behind by a rewind never leaks into the
/// written region.
pub fn copy_in(buf: &mut [u8], pos: usize, src: &[u8], bits: usize, right_aligned: bool) {
    let mut remaining = bits;
    let mut pos = pos;
    let mut i = 0;

    while remaining > 0 {
        let take = remaining.min(8);
        let mut byte = src[i];
        if take < 8 && right_aligned {
            byte <<= 8 - take;
        }
        byte &= high_mask(take);

        let idx = pos >> 3;
        let offset = pos & 7;
        if offset == 0 {
            buf[idx] = byte;
        } else {
            buf[idx] = (buf[idx] & !(0xFFu8 >> offset)) | (byte >> offset);
            if offset + take > 8 {
                buf[idx + 1] = byte << (8 - offset);
            }
        }

        pos += take;
        remaining -= take;
        i += 1;
    }
}

/// Copy `bits` bits starting at bit `pos` of `buf` into `dst`.
///
/// Every touched byte of `dst` is fully assigned; unused low (or high, when
/// right-aligned) bits of a trailing partial byte are zero.
pub fn copy_out(buf: &[u8], pos: usize, dst: &mut [u8], bits: usize, right_aligned: bool) {
    let mut remaining = bits;
    let mut pos = pos;
    let mut i = 0;

    while remaining > 0 {
        let take = remaining.min(8);
        let idx = pos >> 3;
        let offset = pos & 7;

        let mut byte = buf[idx] << offset;
        if offset != 0 && offset + take > 8 {
            byte |= buf[idx + 1] >> (8 - offset);
        }
        byte &= high_mask(take);
        if take < 8 && right_aligned {
            byte >>= 8 - take;
        }
        dst[i] = byte;

        pos += take;
        remaining -= take;
        i += 1;
    }
}

/// Set the bit at `pos` to `bit`, clearing the rest of its byte when `pos`
/// opens a new byte.
#[inline]
pub fn put_bit(buf: &mut [u8], pos: usize, bit: bool) {
    let idx = pos >> 3;
    let offset = pos & 7;
    let mask = 0x80u8 >> offset;
    if offset == 0 {
        buf[idx] = if bit { mask } else { 0 };
    } else if bit {
        buf[idx] |= mask;
    } else {
        buf[idx] &= !mask;
    }
}

/// Test the bit at `pos`.
#[inline]
pub fn get_bit(buf: &[u8], pos: usize) -> bool {
    buf[pos >> 3] & (0x80 >> (pos & 7)) != 0
}
