//! Human-readable dumps of stream content for logs and test failures.

use crate::core::io::BitRead;

/// The written bits as `0`/`1` characters, one space between bytes.
///
/// ```rust
/// use netbits::prelude::*;
/// use netbits::utils::dump::bitify;
///
/// let mut stream = BitStream::new();
/// stream.write(0xA5u8);
/// stream.write_bit(true);
/// assert_eq!(bitify(&stream), "10100101 1");
/// ```
pub fn bitify<R: BitRead + ?Sized>(stream: &R) -> String {
    let bits = stream.written_bits();
    let data = stream.data();
    let mut out = String::with_capacity(bits + bits / 8);
    for pos in 0..bits {
        if pos > 0 && pos % 8 == 0 {
            out.push(' ');
        }
        let set = data[pos >> 3] & (0x80 >> (pos & 7)) != 0;
        out.push(if set { '1' } else { '0' });
    }
    out
}

/// The written bytes as lowercase hex; a trailing partial byte is included
/// with its unused bits zero
pub fn hexlify<R: BitRead + ?Sized>(stream: &R) -> String {
    hex::encode(&stream.data()[..stream.written_bytes()])
}

/// The unread payload as lowercase hex, starting at the byte holding the
/// read cursor
pub fn hexlify_payload<R: BitRead + ?Sized>(stream: &R) -> String {
    let start = stream.read_pos() >> 3;
    hex::encode(&stream.data()[start..stream.written_bytes()])
}
