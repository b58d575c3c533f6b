//! Changed-value encoding.
//!
//! A presence bit, followed by the value only when it differs from the last
//! value sent. Booleans skip the presence bit: the value bit costs the same.
//!
//! ```text
//! write_changed(5u8, 5u8)   -> 0
//! write_changed(6u8, 5u8)   -> 1 00000110
//! write_changed(true, x)    -> 1
//! ```

use crate::compression::mini::Mini;
use crate::core::io::{BitRead, BitWrite};
use crate::core::primitive::Primitive;
use crate::error::Result;

/// Changed-value writes for every [`BitWrite`] implementor
pub trait DeltaWrite: BitWrite {
    fn write_changed<T: Primitive>(&mut self, current: T, last: T) {
        if T::DIRECT_DELTA {
            current.write_to(self);
        } else if current == last {
            self.write_bit(false);
        } else {
            self.write_bit(true);
            current.write_to(self);
        }
    }

    /// No last value known on the receiving side: always send
    fn write_changed_always<T: Primitive>(&mut self, value: T) {
        if !T::DIRECT_DELTA {
            self.write_bit(true);
        }
        value.write_to(self);
    }

    /// [`DeltaWrite::write_changed`] with a mini-encoded value
    fn write_mini_changed<T: Mini>(&mut self, current: T, last: T) -> Result<()> {
        if T::DIRECT_DELTA {
            return current.write_mini_to(self);
        }
        if current == last {
            self.write_bit(false);
            return Ok(());
        }
        current.check_mini()?;
        self.write_bit(true);
        current.write_mini_to(self)
    }

    fn write_mini_changed_always<T: Mini>(&mut self, value: T) -> Result<()> {
        if T::DIRECT_DELTA {
            return value.write_mini_to(self);
        }
        value.check_mini()?;
        self.write_bit(true);
        value.write_mini_to(self)
    }
}

impl<W: BitWrite + ?Sized> DeltaWrite for W {}

/// Changed-value reads for every [`BitRead`] implementor
pub trait DeltaRead: BitRead {
    /// Update `dest` when a new value was sent.
    ///
    /// Returns whether `dest` changed; on error `dest` is left as it was.
    fn read_changed<T: Primitive>(&mut self, dest: &mut T) -> Result<bool> {
        if T::DIRECT_DELTA {
            let value = T::read_from(self)?;
            let changed = value != *dest;
            *dest = value;
            return Ok(changed);
        }
        if !self.read_bit()? {
            return Ok(false);
        }
        *dest = T::read_from(self)?;
        Ok(true)
    }

    fn read_mini_changed<T: Mini>(&mut self, dest: &mut T) -> Result<bool> {
        if T::DIRECT_DELTA {
            let value = T::read_mini_from(self)?;
            let changed = value != *dest;
            *dest = value;
            return Ok(changed);
        }
        if !self.read_bit()? {
            return Ok(false);
        }
        *dest = T::read_mini_from(self)?;
        Ok(true)
    }
}

impl<R: BitRead + ?Sized> DeltaRead for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffer::BitStream;
    use crate::error::CodecError;

    #[test]
    fn test_unchanged_costs_one_bit() {
        let mut stream = BitStream::new();
        stream.write_changed(1234u32, 1234u32);
        assert_eq!(stream.written_bits(), 1);

        let mut dest = 77u32;
        assert!(!stream.read_changed(&mut dest).unwrap());
        assert_eq!(dest, 77);
        stream.assert_consumed();
    }

    #[test]
    fn test_changed_sends_value() {
        let mut stream = BitStream::new();
        stream.write_changed(5678u32, 1234u32);
        assert_eq!(stream.written_bits(), 33);

        let mut dest = 1234u32;
        assert!(stream.read_changed(&mut dest).unwrap());
        assert_eq!(dest, 5678);
    }

    #[test]
    fn test_bool_has_no_presence_bit() {
        let mut stream = BitStream::new();
        stream.write_changed(true, true);
        stream.write_changed_always(false);
        assert_eq!(stream.written_bits(), 2);

        let mut flag = false;
        assert!(stream.read_changed(&mut flag).unwrap());
        assert!(flag);
        assert!(stream.read_changed(&mut flag).unwrap());
        assert!(!flag);
    }

    #[test]
    fn test_always_sets_presence() {
        let mut stream = BitStream::new();
        stream.write_changed_always(9i16);
        assert_eq!(stream.written_bits(), 17);
        let mut dest = 9i16;
        assert!(stream.read_changed(&mut dest).unwrap());
        assert_eq!(dest, 9);
    }

    #[test]
    fn test_mini_changed() {
        let mut stream = BitStream::new();
        stream.write_mini_changed(3u64, 3u64).unwrap();
        stream.write_mini_changed(300u64, 3u64).unwrap();
        stream.write_mini_changed_always(0u64).unwrap();
        assert_eq!(stream.written_bits(), 1 + (1 + 19) + (1 + 1));

        let mut dest = 3u64;
        assert!(!stream.read_mini_changed(&mut dest).unwrap());
        assert!(stream.read_mini_changed(&mut dest).unwrap());
        assert_eq!(dest, 300);
        assert!(stream.read_mini_changed(&mut dest).unwrap());
        assert_eq!(dest, 0);
        stream.assert_consumed();
    }

    #[test]
    fn test_mini_changed_float_error_writes_nothing() {
        let mut stream = BitStream::new();
        assert!(matches!(
            stream.write_mini_changed(2.0f32, 0.0),
            Err(CodecError::FloatOutOfRange(_))
        ));
        assert_eq!(stream.written_bits(), 0);
    }

    #[test]
    fn test_truncated_value_keeps_dest() {
        let mut stream = BitStream::new();
        stream.write_bit(true);
        stream.write_bits(&[0xAB], 8, true);
        let mut dest = 1u32;
        assert!(stream.read_changed(&mut dest).is_err());
        assert_eq!(dest, 1);
    }
}
