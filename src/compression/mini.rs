//! Mini encoding.
//!
//! Integers drop their insignificant high bytes. Each significant byte,
//! starting from the least significant, is sent as a `1` bit followed by the
//! byte; a single `0` bit ends the sequence:
//!
//! ```text
//! 0u32        -> 0
//! 0x2Au32     -> 1 00101010 0
//! 300000u32   -> 1 11100000 1 10010011 1 00000100 0      (28 bits)
//! u16::MAX    -> 1 11111111 1 11111111                   (no terminator)
//! ```
//!
//! The terminator is left out once every byte of the type has been sent, so
//! the worst case costs one bit per byte over the fixed-width encoding.
//!
//! The default treatment is unsigned: a negative value sends every byte. The
//! `_signed` variants stop at the shortest two's-complement prefix instead
//! and sign-extend on decode.
//!
//! [`U24`] is sent as a mini `u32`. A socket address is a mini version tag,
//! then for IPv4 the complemented address as a mini `u32` and for IPv6 the
//! 16 raw octets, then the port as a mini `u16`.
//!
//! Floats in `[-1, 1]` become fixed point: `f32` as a mini `u16`, `f64` as a
//! mini `u32`. Both map -1 to 0. `f32` maps 1 to `u16::MAX`; the `f64` scale
//! is 2^31, so 1 lands one past `u32::MAX` and saturates there.

use crate::core::cursor::bytes_to_bits;
use crate::core::io::{rewind_on_err, BitRead, BitWrite};
use crate::core::primitive::{Integral, Primitive, IPV4_TAG, IPV6_TAG, U24};
use crate::error::{CodecError, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Largest magnitude accepted by the float encodings; values between 1 and
/// this limit are clamped to 1
pub const FLOAT_LIMIT: f64 = 1.01;

const F32_SCALE: f64 = 32767.5;
const F64_SCALE: f64 = 2147483648.0;

/// A value with a mini encoding
pub trait Mini: Primitive {
    /// Fail early, before anything is written, when `self` has no mini form
    fn check_mini(&self) -> Result<()> {
        Ok(())
    }

    fn write_mini_to<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<()>;

    fn read_mini_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self>;
}

pub(crate) fn write_mini_integral<W: BitWrite + ?Sized, T: Integral>(w: &mut W, value: T) {
    let bytes = value.to_le();
    let significant = T::BYTES - (value.unsigned_leading_zeros() / 8) as usize;
    write_le_prefix::<W, T>(w, bytes.as_ref(), significant);
}

pub(crate) fn read_mini_integral<R: BitRead + ?Sized, T: Integral>(r: &mut R) -> Result<T> {
    let mut bytes = T::Bytes::default();
    read_le_prefix::<R, T>(r, bytes.as_mut())?;
    Ok(T::from_le(bytes))
}

fn write_le_prefix<W: BitWrite + ?Sized, T: Integral>(w: &mut W, le: &[u8], count: usize) {
    for byte in &le[..count] {
        w.write_bit(true);
        w.write_bits(std::slice::from_ref(byte), 8, true);
    }
    if count < T::BYTES {
        w.write_bit(false);
    }
}

/// Returns the number of bytes read into the front of `le`
fn read_le_prefix<R: BitRead + ?Sized, T: Integral>(r: &mut R, le: &mut [u8]) -> Result<usize> {
    let mut count = 0;
    while count < T::BYTES {
        if !r.read_bit()? {
            break;
        }
        r.read_bits(&mut le[count..count + 1], 8, true)?;
        count += 1;
    }
    Ok(count)
}

/// Bytes needed for the shortest two's-complement prefix of `le`.
///
/// Zero needs none; any negative value needs at least one.
fn signed_prefix_len(le: &[u8]) -> usize {
    let negative = le[le.len() - 1] & 0x80 != 0;
    let fill = if negative { 0xFF } else { 0x00 };

    let mut len = le.len();
    while len > 0 && le[len - 1] == fill {
        let droppable = if len == 1 {
            !negative
        } else {
            (le[len - 2] & 0x80 != 0) == negative
        };
        if !droppable {
            break;
        }
        len -= 1;
    }
    len
}

macro_rules! impl_mini_integral {
    ($($ty:ty),*) => {$(
        impl Mini for $ty {
            #[inline]
            fn write_mini_to<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<()> {
                write_mini_integral(w, *self);
                Ok(())
            }

            #[inline]
            fn read_mini_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
                read_mini_integral(r)
            }
        }
    )*};
}

impl_mini_integral!(u8, i8, u16, i16, u32, i32, u64, i64);

impl Mini for bool {
    #[inline]
    fn write_mini_to<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<()> {
        w.write_bit(*self);
        Ok(())
    }

    #[inline]
    fn read_mini_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
        r.read_bit()
    }
}

impl Mini for U24 {
    fn write_mini_to<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<()> {
        write_mini_integral(w, self.get());
        Ok(())
    }

    fn read_mini_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
        rewind_on_err(r, |r| {
            let value: u32 = read_mini_integral(r)?;
            U24::new(value).ok_or_else(|| CodecError::out_of_range(value, 0, U24::MAX.get()))
        })
    }
}

impl Mini for SocketAddr {
    fn write_mini_to<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<()> {
        match self.ip() {
            IpAddr::V4(ip) => {
                write_mini_integral(w, IPV4_TAG);
                write_mini_integral(w, !u32::from_be_bytes(ip.octets()));
            }
            IpAddr::V6(ip) => {
                write_mini_integral(w, IPV6_TAG);
                w.write_bits(&ip.octets(), 128, true);
            }
        }
        write_mini_integral(w, self.port());
        Ok(())
    }

    /// A truncated or unknown address leaves the read cursor untouched
    fn read_mini_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
        rewind_on_err(r, |r| {
            let ip = match read_mini_integral::<R, u8>(r)? {
                IPV4_TAG => {
                    let hidden: u32 = read_mini_integral(r)?;
                    IpAddr::V4(Ipv4Addr::from((!hidden).to_be_bytes()))
                }
                IPV6_TAG => {
                    let mut octets = [0u8; 16];
                    r.read_bits(&mut octets, 128, true)?;
                    IpAddr::V6(Ipv6Addr::from(octets))
                }
                other => return Err(CodecError::InvalidAddressFamily(other)),
            };
            let port: u16 = read_mini_integral(r)?;
            Ok(SocketAddr::new(ip, port))
        })
    }
}

/// Clamp a normalized float into `[-1, 1]`, rejecting anything past
/// [`FLOAT_LIMIT`] and NaN
pub(crate) fn checked_unit(value: f64) -> Result<f64> {
    if value.abs() <= FLOAT_LIMIT {
        Ok(value.clamp(-1.0, 1.0))
    } else {
        Err(CodecError::FloatOutOfRange(value))
    }
}

impl Mini for f32 {
    fn check_mini(&self) -> Result<()> {
        checked_unit(*self as f64).map(drop)
    }

    fn write_mini_to<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<()> {
        let unit = checked_unit(*self as f64)?;
        let fixed = ((unit + 1.0) * F32_SCALE).round() as u16;
        write_mini_integral(w, fixed);
        Ok(())
    }

    fn read_mini_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
        let fixed: u16 = read_mini_integral(r)?;
        Ok((fixed as f64 / F32_SCALE - 1.0) as f32)
    }
}

impl Mini for f64 {
    fn check_mini(&self) -> Result<()> {
        checked_unit(*self).map(drop)
    }

    fn write_mini_to<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<()> {
        let unit = checked_unit(*self)?;
        let fixed = ((unit + 1.0) * F64_SCALE).round().min(u32::MAX as f64) as u32;
        write_mini_integral(w, fixed);
        Ok(())
    }

    fn read_mini_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
        let fixed: u32 = read_mini_integral(r)?;
        Ok(fixed as f64 / F64_SCALE - 1.0)
    }
}

/// Mini writes for every [`BitWrite`] implementor
pub trait MiniWrite: BitWrite {
    /// Fails only for floats outside `[-1.01, 1.01]`
    #[inline]
    fn write_mini<T: Mini>(&mut self, value: T) -> Result<()> {
        value.write_mini_to(self)
    }

    /// Mini-encode the shortest two's-complement form of `value`
    fn write_mini_signed<T: Integral>(&mut self, value: T) {
        let bytes = value.to_le();
        let len = signed_prefix_len(bytes.as_ref());
        write_le_prefix::<Self, T>(self, bytes.as_ref(), len);
    }

    /// Mini-encoded length (at most `max`), then `src[..length]` byte-aligned.
    ///
    /// Input longer than `max` is truncated; the written length is returned.
    fn write_aligned_bytes_bounded(&mut self, src: &[u8], max: u32) -> u32 {
        let length = src.len().min(max as usize) as u32;
        write_mini_integral(self, length);
        self.write_aligned_bytes(&src[..length as usize]);
        length
    }
}

impl<W: BitWrite + ?Sized> MiniWrite for W {}

/// Mini reads for every [`BitRead`] implementor
pub trait MiniRead: BitRead {
    #[inline]
    fn read_mini<T: Mini>(&mut self) -> Result<T> {
        T::read_mini_from(self)
    }

    fn read_mini_signed<T: Integral>(&mut self) -> Result<T> {
        let mut bytes = T::Bytes::default();
        let le = bytes.as_mut();
        let len = read_le_prefix::<Self, T>(self, le)?;
        if len > 0 && le[len - 1] & 0x80 != 0 {
            le[len..].fill(0xFF);
        }
        Ok(T::from_le(bytes))
    }

    /// Read bytes written by [`MiniWrite::write_aligned_bytes_bounded`].
    ///
    /// A length prefix above `max` fails before anything is allocated.
    fn read_aligned_bytes_bounded(&mut self, max: u32) -> Result<Vec<u8>> {
        let length: u32 = read_mini_integral(self)?;
        if length > max {
            return Err(CodecError::LengthLimitExceeded {
                length: length as usize,
                limit: max as usize,
            });
        }
        let length = length as usize;
        if length == 0 {
            return Ok(Vec::new());
        }
        self.align_read();
        self.require(bytes_to_bits(length))?;
        let mut out = vec![0u8; length];
        self.read_aligned_bytes(&mut out)?;
        Ok(out)
    }

    /// [`MiniRead::read_aligned_bytes_bounded`] capped at the stream's own
    /// [`BitRead::read_limit`]
    fn read_aligned_bytes_limited(&mut self) -> Result<Vec<u8>> {
        let limit = self.read_limit();
        self.read_aligned_bytes_bounded(limit)
    }
}

impl<R: BitRead + ?Sized> MiniRead for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffer::BitStream;

    #[test]
    fn test_zero_is_one_bit() {
        let mut stream = BitStream::new();
        stream.write_mini(0u64).unwrap();
        assert_eq!(stream.written_bits(), 1);
        assert_eq!(stream.read_mini::<u64>().unwrap(), 0);
    }

    #[test]
    fn test_300000_fits_in_28_bits() {
        let mut stream = BitStream::new();
        stream.write_mini(300_000u32).unwrap();
        assert_eq!(stream.written_bits(), 28);
        assert_eq!(stream.read_mini::<u32>().unwrap(), 300_000);
        stream.assert_consumed();
    }

    #[test]
    fn test_full_width_has_no_terminator() {
        let mut stream = BitStream::new();
        stream.write_mini(u16::MAX).unwrap();
        assert_eq!(stream.written_bits(), 18);
        stream.write_mini(0x0100u16).unwrap();
        assert_eq!(stream.written_bits(), 36);
        assert_eq!(stream.read_mini::<u16>().unwrap(), u16::MAX);
        assert_eq!(stream.read_mini::<u16>().unwrap(), 0x0100);
    }

    #[test]
    fn test_negative_unsigned_treatment_sends_every_byte() {
        let mut stream = BitStream::new();
        stream.write_mini(-1i32).unwrap();
        assert_eq!(stream.written_bits(), 36);
        assert_eq!(stream.read_mini::<i32>().unwrap(), -1);
    }

    #[test]
    fn test_signed_variant_is_short_for_small_negatives() {
        let mut stream = BitStream::new();
        stream.write_mini_signed(-1i32);
        assert_eq!(stream.written_bits(), 10);
        stream.write_mini_signed(200i32);
        assert_eq!(stream.written_bits(), 10 + 19);
        stream.write_mini_signed(-129i64);
        stream.write_mini_signed(0i16);
        stream.write_mini_signed(i64::MIN);

        assert_eq!(stream.read_mini_signed::<i32>().unwrap(), -1);
        assert_eq!(stream.read_mini_signed::<i32>().unwrap(), 200);
        assert_eq!(stream.read_mini_signed::<i64>().unwrap(), -129);
        assert_eq!(stream.read_mini_signed::<i16>().unwrap(), 0);
        assert_eq!(stream.read_mini_signed::<i64>().unwrap(), i64::MIN);
        stream.assert_consumed();
    }

    #[test]
    fn test_signed_prefix_lengths() {
        assert_eq!(signed_prefix_len(&0i32.to_le_bytes()), 0);
        assert_eq!(signed_prefix_len(&127i32.to_le_bytes()), 1);
        assert_eq!(signed_prefix_len(&128i32.to_le_bytes()), 2);
        assert_eq!(signed_prefix_len(&(-128i32).to_le_bytes()), 1);
        assert_eq!(signed_prefix_len(&(-129i32).to_le_bytes()), 2);
        assert_eq!(signed_prefix_len(&u32::MAX.to_le_bytes()), 1);
    }

    #[test]
    fn test_mini_u24() {
        let mut stream = BitStream::new();
        stream.write_mini(U24::truncate(0x00_0102)).unwrap();
        assert_eq!(stream.written_bits(), 19);
        stream.write_mini(U24::MAX).unwrap();
        assert_eq!(stream.read_mini::<U24>().unwrap().get(), 0x0102);
        assert_eq!(stream.read_mini::<U24>().unwrap(), U24::MAX);
        stream.assert_consumed();
    }

    #[test]
    fn test_mini_u24_rejects_wide_values() {
        let mut stream = BitStream::new();
        stream.write_mini(0x0100_0000u32).unwrap();
        assert!(matches!(
            stream.read_mini::<U24>(),
            Err(CodecError::OutOfRange { .. })
        ));
        assert_eq!(stream.read_pos(), 0);
    }

    #[test]
    fn test_mini_ipv4_address() {
        let addr: SocketAddr = "192.168.1.20:7777".parse().unwrap();
        let mut stream = BitStream::new();
        stream.write_mini(addr).unwrap();
        // 9-bit tag, 36-bit complemented address, 18-bit port
        assert_eq!(stream.written_bits(), 9 + 36 + 18);
        assert_eq!(stream.read_mini::<u8>().unwrap(), 4);
        assert_eq!(
            stream.read_mini::<u32>().unwrap(),
            !u32::from_be_bytes([192, 168, 1, 20])
        );
        assert_eq!(stream.read_mini::<u16>().unwrap(), 7777);

        stream.reset_read();
        assert_eq!(stream.read_mini::<SocketAddr>().unwrap(), addr);
        stream.assert_consumed();
    }

    #[test]
    fn test_mini_ipv6_address() {
        let addr: SocketAddr = "[2001:db8::42]:443".parse().unwrap();
        let mut stream = BitStream::new();
        stream.write_bit(true);
        stream.write_mini(addr).unwrap();
        assert_eq!(stream.written_bits(), 1 + 9 + 128 + 18);
        assert!(stream.read_bit().unwrap());
        assert_eq!(stream.read_mini::<SocketAddr>().unwrap(), addr);
    }

    #[test]
    fn test_mini_address_failures_rewind() {
        let mut stream = BitStream::new();
        write_mini_integral(&mut stream, 5u8);
        write_mini_integral(&mut stream, 0u32);
        assert!(matches!(
            stream.read_mini::<SocketAddr>(),
            Err(CodecError::InvalidAddressFamily(5))
        ));
        assert_eq!(stream.read_pos(), 0);

        let mut stream = BitStream::new();
        write_mini_integral(&mut stream, IPV4_TAG);
        write_mini_integral(&mut stream, 7u32);
        assert!(stream.read_mini::<SocketAddr>().is_err());
        assert_eq!(stream.read_pos(), 0);
    }

    #[test]
    fn test_mini_f32_precision() {
        let mut stream = BitStream::new();
        let values = [-1.0f32, -0.5, 0.0, 0.123_456, 0.999, 1.0, 1.005];
        for v in values {
            stream.write_mini(v).unwrap();
        }
        for v in values {
            let decoded = stream.read_mini::<f32>().unwrap();
            assert!((decoded - v.clamp(-1.0, 1.0)).abs() < 1.6e-5, "{v} -> {decoded}");
        }
    }

    #[test]
    fn test_mini_f64_precision() {
        let mut stream = BitStream::new();
        for v in [-1.0f64, -0.333_333_333, 0.0, 0.75, 1.0] {
            stream.write_mini(v).unwrap();
            let decoded = stream.read_mini::<f64>().unwrap();
            assert!((decoded - v).abs() < 4.7e-10, "{v} -> {decoded}");
        }
    }

    #[test]
    fn test_mini_f64_fixed_point() {
        let mut stream = BitStream::new();
        stream.write_mini(0.5f64).unwrap();
        stream.write_mini(1.0f64).unwrap();
        stream.write_mini(-1.0f64).unwrap();
        assert_eq!(stream.read_mini::<u32>().unwrap(), 3_221_225_472);
        assert_eq!(stream.read_mini::<u32>().unwrap(), u32::MAX);
        assert_eq!(stream.read_mini::<u32>().unwrap(), 0);

        let mut stream = BitStream::new();
        stream.write_mini(0x8000_0000u32).unwrap();
        assert_eq!(stream.read_mini::<f64>().unwrap(), 0.0);
    }

    #[test]
    fn test_mini_float_rejects_out_of_range() {
        let mut stream = BitStream::new();
        assert!(matches!(
            stream.write_mini(1.5f32),
            Err(CodecError::FloatOutOfRange(_))
        ));
        assert!(stream.write_mini(f64::NAN).is_err());
        assert_eq!(stream.written_bits(), 0);
    }

    #[test]
    fn test_bounded_bytes() {
        let mut stream = BitStream::new();
        stream.write_bit(true);
        assert_eq!(stream.write_aligned_bytes_bounded(b"hello world", 5), 5);
        assert!(stream.read_bit().unwrap());
        assert_eq!(stream.read_aligned_bytes_bounded(16).unwrap(), b"hello");
        stream.assert_consumed();
    }

    #[test]
    fn test_bounded_bytes_limit_on_read() {
        let mut stream = BitStream::new();
        stream.write_aligned_bytes_bounded(&[7u8; 64], 64);
        assert!(matches!(
            stream.read_aligned_bytes_bounded(32),
            Err(CodecError::LengthLimitExceeded {
                length: 64,
                limit: 32
            })
        ));
    }

    #[test]
    fn test_limited_bytes_follow_stream_limit() {
        let mut stream = BitStream::new().with_read_limit(8);
        stream.write_aligned_bytes_bounded(b"short", 64);
        stream.write_aligned_bytes_bounded(b"far too long", 64);
        assert_eq!(stream.read_aligned_bytes_limited().unwrap(), b"short");
        assert!(matches!(
            stream.read_aligned_bytes_limited(),
            Err(CodecError::LengthLimitExceeded {
                length: 12,
                limit: 8
            })
        ));
    }

    #[test]
    fn test_bounded_bytes_truncated_payload() {
        let mut stream = BitStream::new();
        write_mini_integral(&mut stream, 1000u32);
        assert!(matches!(
            stream.read_aligned_bytes_bounded(u32::MAX),
            Err(CodecError::InsufficientPayload { .. })
        ));
    }
}
