//! Fixed-width primitives on the wire.
//!
//! Multi-byte values travel in network (big-endian) byte order whatever the
//! host order is; one-byte values are copied as-is and booleans take a single
//! bit. Socket addresses keep their raw octets (no byte swapping), with the
//! IPv4 address complemented so that address-rewriting middleboxes do not
//! recognise and mangle it.

use crate::core::io::{rewind_on_err, BitRead, BitWrite};
use crate::error::{CodecError, Result};
use std::fmt::{Debug, Display};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

mod sealed {
    pub trait Sealed {}
}

/// A value with a fixed wire representation
pub trait Primitive: Copy + PartialEq + Debug {
    /// Changed-value encoding writes the value itself instead of a presence
    /// bit followed by the value (set for `bool`, where both cost one bit)
    const DIRECT_DELTA: bool = false;

    fn write_to<W: BitWrite + ?Sized>(&self, w: &mut W);

    fn read_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self>;
}

/// Fixed-width integers: `u8`, `i8`, `u16`, `i16`, `u32`, `i32`, `u64`, `i64`
pub trait Integral: Primitive + PartialOrd + Display + sealed::Sealed {
    const BYTES: usize;
    const BITS: u32;
    const SIGNED: bool;

    /// `[u8; BYTES]`
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default + Copy;

    fn to_be(self) -> Self::Bytes;
    fn from_be(bytes: Self::Bytes) -> Self;
    fn to_le(self) -> Self::Bytes;
    fn from_le(bytes: Self::Bytes) -> Self;

    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_add(self, rhs: Self) -> Self;

    /// Leading zeros of the two's-complement bit pattern
    fn unsigned_leading_zeros(self) -> u32;

    fn to_i128(self) -> i128;
    fn from_i128(value: i128) -> Option<Self>;
}

macro_rules! impl_integral {
    ($($ty:ty => $unsigned:ty),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl Primitive for $ty {
            #[inline]
            fn write_to<W: BitWrite + ?Sized>(&self, w: &mut W) {
                w.write_bits(&self.to_be_bytes(), <$ty>::BITS as usize, true);
            }

            #[inline]
            fn read_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                r.read_bits(&mut bytes, <$ty>::BITS as usize, true)?;
                Ok(<$ty>::from_be_bytes(bytes))
            }
        }

        impl Integral for $ty {
            const BYTES: usize = std::mem::size_of::<$ty>();
            const BITS: u32 = <$ty>::BITS;
            const SIGNED: bool = <$ty>::MIN != 0;

            type Bytes = [u8; std::mem::size_of::<$ty>()];

            #[inline]
            fn to_be(self) -> Self::Bytes {
                self.to_be_bytes()
            }

            #[inline]
            fn from_be(bytes: Self::Bytes) -> Self {
                <$ty>::from_be_bytes(bytes)
            }

            #[inline]
            fn to_le(self) -> Self::Bytes {
                self.to_le_bytes()
            }

            #[inline]
            fn from_le(bytes: Self::Bytes) -> Self {
                <$ty>::from_le_bytes(bytes)
            }

            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$ty>::wrapping_sub(self, rhs)
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$ty>::wrapping_add(self, rhs)
            }

            #[inline]
            fn unsigned_leading_zeros(self) -> u32 {
                (self as $unsigned).leading_zeros()
            }

            #[inline]
            fn to_i128(self) -> i128 {
                self as i128
            }

            #[inline]
            fn from_i128(value: i128) -> Option<Self> {
                <$ty>::try_from(value).ok()
            }
        }
    )*};
}

impl_integral! {
    u8 => u8,
    i8 => u8,
    u16 => u16,
    i16 => u16,
    u32 => u32,
    i32 => u32,
    u64 => u64,
    i64 => u64,
}

impl Primitive for bool {
    const DIRECT_DELTA: bool = true;

    #[inline]
    fn write_to<W: BitWrite + ?Sized>(&self, w: &mut W) {
        w.write_bit(*self);
    }

    #[inline]
    fn read_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
        r.read_bit()
    }
}

impl Primitive for f32 {
    fn write_to<W: BitWrite + ?Sized>(&self, w: &mut W) {
        w.write_bits(&self.to_bits().to_be_bytes(), 32, true);
    }

    fn read_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
        let mut bytes = [0u8; 4];
        r.read_bits(&mut bytes, 32, true)?;
        Ok(f32::from_bits(u32::from_be_bytes(bytes)))
    }
}

impl Primitive for f64 {
    fn write_to<W: BitWrite + ?Sized>(&self, w: &mut W) {
        w.write_bits(&self.to_bits().to_be_bytes(), 64, true);
    }

    fn read_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
        let mut bytes = [0u8; 8];
        r.read_bits(&mut bytes, 64, true)?;
        Ok(f64::from_bits(u64::from_be_bytes(bytes)))
    }
}

/// Unsigned 24-bit integer, three bytes on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct U24(u32);

impl U24 {
    pub const MAX: U24 = U24(0x00FF_FFFF);

    /// `None` when `value` needs more than 24 bits
    pub const fn new(value: u32) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(U24(value))
        } else {
            None
        }
    }

    /// Keep the low 24 bits of `value`
    pub const fn truncate(value: u32) -> Self {
        U24(value & Self::MAX.0)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<U24> for u32 {
    fn from(value: U24) -> Self {
        value.0
    }
}

impl Display for U24 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Primitive for U24 {
    fn write_to<W: BitWrite + ?Sized>(&self, w: &mut W) {
        let [_, hi, mid, lo] = self.0.to_be_bytes();
        w.write_bits(&[hi, mid, lo], 24, true);
    }

    fn read_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
        let mut bytes = [0u8; 3];
        r.read_bits(&mut bytes, 24, true)?;
        Ok(U24(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])))
    }
}

/// IP version tag preceding an encoded socket address
pub(crate) const IPV4_TAG: u8 = 4;
pub(crate) const IPV6_TAG: u8 = 6;

impl Primitive for SocketAddr {
    fn write_to<W: BitWrite + ?Sized>(&self, w: &mut W) {
        match self.ip() {
            IpAddr::V4(ip) => {
                w.write_bits(&[IPV4_TAG], 8, true);
                let hidden = ip.octets().map(|octet| !octet);
                w.write_bits(&hidden, 32, true);
            }
            IpAddr::V6(ip) => {
                w.write_bits(&[IPV6_TAG], 8, true);
                w.write_bits(&ip.octets(), 128, true);
            }
        }
        w.write_bits(&self.port().to_be_bytes(), 16, true);
    }

    /// A truncated or unknown address leaves the read cursor untouched
    fn read_from<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
        rewind_on_err(r, |r| {
            let mut tag = [0u8; 1];
            r.read_bits(&mut tag, 8, true)?;
            let ip = match tag[0] {
                IPV4_TAG => {
                    let mut octets = [0u8; 4];
                    r.read_bits(&mut octets, 32, true)?;
                    IpAddr::V4(Ipv4Addr::from(octets.map(|octet| !octet)))
                }
                IPV6_TAG => {
                    let mut octets = [0u8; 16];
                    r.read_bits(&mut octets, 128, true)?;
                    IpAddr::V6(Ipv6Addr::from(octets))
                }
                other => return Err(CodecError::InvalidAddressFamily(other)),
            };
            let mut port = [0u8; 2];
            r.read_bits(&mut port, 16, true)?;
            Ok(SocketAddr::new(ip, u16::from_be_bytes(port)))
        })
    }
}

/// Typed writes for every [`BitWrite`] implementor
pub trait PrimitiveWrite: BitWrite {
    /// Write `value` in its fixed wire representation
    #[inline]
    fn write<T: Primitive>(&mut self, value: T) {
        value.write_to(self);
    }

    /// Write `value` narrowed to the wire type `S` to save bandwidth,
    /// e.g. a `u32` known to fit in a `u8`
    fn write_casted<S: Integral, T: Integral>(&mut self, value: T) -> Result<()> {
        let narrowed = S::from_i128(value.to_i128()).ok_or_else(|| CodecError::OutOfRange {
            value: value.to_string(),
            min: std::any::type_name::<S>().to_string(),
            max: std::any::type_name::<S>().to_string(),
        })?;
        narrowed.write_to(self);
        Ok(())
    }
}

impl<W: BitWrite + ?Sized> PrimitiveWrite for W {}

/// Typed reads for every [`BitRead`] implementor
pub trait PrimitiveRead: BitRead {
    #[inline]
    fn read<T: Primitive>(&mut self) -> Result<T> {
        T::read_from(self)
    }

    /// Read into an existing slot; `dest` is untouched on error
    fn read_into<T: Primitive>(&mut self, dest: &mut T) -> Result<()> {
        *dest = T::read_from(self)?;
        Ok(())
    }

    /// Read a value written with [`PrimitiveWrite::write_casted`] as `S` and
    /// widen it back to `T`
    fn read_casted<S: Integral, T: Integral>(&mut self) -> Result<T> {
        let wire = S::read_from(self)?;
        T::from_i128(wire.to_i128()).ok_or_else(|| CodecError::OutOfRange {
            value: wire.to_string(),
            min: std::any::type_name::<T>().to_string(),
            max: std::any::type_name::<T>().to_string(),
        })
    }
}

impl<R: BitRead + ?Sized> PrimitiveRead for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffer::BitStream;
    use crate::core::reader::BitReader;

    #[test]
    fn test_integers_are_big_endian_on_the_wire() {
        let mut stream = BitStream::new();
        stream.write(0x1234_5678u32);
        stream.write(0xABu8);
        assert_eq!(stream.as_bytes(), &[0x12, 0x34, 0x56, 0x78, 0xAB]);
        assert_eq!(stream.read::<u32>().unwrap(), 0x1234_5678);
        assert_eq!(stream.read::<u8>().unwrap(), 0xAB);
    }

    #[test]
    fn test_bool_is_one_bit() {
        let mut stream = BitStream::new();
        stream.write(true);
        stream.write(false);
        stream.write(-2i16);
        assert_eq!(stream.written_bits(), 18);
        assert!(stream.read::<bool>().unwrap());
        assert!(!stream.read::<bool>().unwrap());
        assert_eq!(stream.read::<i16>().unwrap(), -2);
        stream.assert_consumed();
    }

    #[test]
    fn test_ipv4_is_complemented() {
        let addr: SocketAddr = "192.168.1.20:7777".parse().unwrap();
        let mut stream = BitStream::new();
        stream.write(addr);
        assert_eq!(
            stream.as_bytes(),
            &[4u8, !192u8, !168u8, !1u8, !20u8, (7777u16 >> 8) as u8, (7777u16 & 0xFF) as u8]
        );
        assert_eq!(stream.read::<SocketAddr>().unwrap(), addr);
    }

    #[test]
    fn test_ipv6_roundtrip() {
        let addr: SocketAddr = "[2001:db8::42]:443".parse().unwrap();
        let mut stream = BitStream::new();
        stream.write_bit(true);
        stream.write(addr);
        assert_eq!(stream.written_bits(), 1 + 8 + 128 + 16);
        assert!(stream.read_bit().unwrap());
        assert_eq!(stream.read::<SocketAddr>().unwrap(), addr);
    }

    #[test]
    fn test_unknown_address_family() {
        let mut stream = BitStream::new();
        stream.write(5u8);
        stream.write(0u64);
        assert!(matches!(
            stream.read::<SocketAddr>(),
            Err(CodecError::InvalidAddressFamily(5))
        ));
    }

    #[test]
    fn test_truncated_address_rewinds() {
        let mut reader = BitReader::new(&[4, 1, 2]);
        assert!(matches!(
            reader.read::<SocketAddr>(),
            Err(CodecError::InsufficientPayload { .. })
        ));
        assert_eq!(reader.read_pos(), 0);

        let mut reader = BitReader::new(&[9, 0, 0, 0, 0, 0, 0]);
        assert!(reader.read::<SocketAddr>().is_err());
        assert_eq!(reader.read::<u8>().unwrap(), 9);
    }

    #[test]
    fn test_u24() {
        assert!(U24::new(0x0100_0000).is_none());
        assert_eq!(U24::truncate(0x0123_4567).get(), 0x23_4567);

        let mut stream = BitStream::new();
        stream.write(U24::MAX);
        stream.write(U24::truncate(0x0A0B0C));
        assert_eq!(stream.written_bits(), 48);
        assert_eq!(stream.as_bytes()[3..], [0x0A, 0x0B, 0x0C]);
        assert_eq!(stream.read::<U24>().unwrap(), U24::MAX);
        assert_eq!(stream.read::<U24>().unwrap().get(), 0x0A0B0C);
    }

    #[test]
    fn test_casted_integers() {
        let mut stream = BitStream::new();
        stream.write_casted::<u8, u32>(53).unwrap();
        assert_eq!(stream.written_bits(), 8);
        assert!(stream.write_casted::<u8, i32>(-1).is_err());
        assert!(stream.write_casted::<u8, u32>(300).is_err());
        assert_eq!(stream.written_bits(), 8);
        assert_eq!(stream.read_casted::<u8, u64>().unwrap(), 53);
    }

    #[test]
    fn test_signedness_flag() {
        assert!(i32::SIGNED);
        assert!(!u16::SIGNED);
        assert_eq!(u16::BYTES, 2);
        assert_eq!((-1i8).unsigned_leading_zeros(), 0);
        assert_eq!(20u32.unsigned_leading_zeros(), 27);
    }
}
