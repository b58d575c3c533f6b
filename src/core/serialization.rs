//! # Message Serialization
//!
//! Two ways to describe how a message type travels over a [`BitStream`].
//!
//! ## Wire
//! Implement [`Wire`] with an `encode`/`decode` pair. Every [`Primitive`] is
//! already `Wire`, so structs compose field by field.
//!
//! ## Direction
//! Write one `serialize` function that takes a [`Direction`] and reads into
//! or writes from the same `&mut` fields. Encode and decode then cannot drift
//! apart, which is the classic source of desynchronized packets.
//!
//! ```rust
//! use netbits::prelude::*;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct PlayerState {
//!     health: u16,
//!     alive: bool,
//!     score: u32,
//! }
//!
//! impl PlayerState {
//!     fn serialize(&mut self, stream: &mut BitStream, dir: Direction) -> netbits::error::Result<()> {
//!         stream.serialize_ranged(dir, &mut self.health, 0, 1000, false)?;
//!         stream.serialize(dir, &mut self.alive)?;
//!         stream.serialize_mini(dir, &mut self.score)
//!     }
//! }
//!
//! let mut out = PlayerState { health: 850, alive: true, score: 12 };
//! let mut stream = BitStream::new();
//! out.serialize(&mut stream, Direction::Encode).unwrap();
//!
//! let mut back = PlayerState::default();
//! back.serialize(&mut stream, Direction::Decode).unwrap();
//! assert_eq!(out, back);
//! ```

use crate::compression::delta::{DeltaRead, DeltaWrite};
use crate::compression::geometry::{GeometryRead, GeometryWrite};
use crate::compression::mini::{Mini, MiniRead, MiniWrite};
use crate::compression::ranged::{RangedRead, RangedWrite};
use crate::compression::Real;
use crate::core::buffer::BitStream;
use crate::core::io::{BitRead, BitWrite};
use crate::core::primitive::{Integral, Primitive, PrimitiveRead, PrimitiveWrite};
use crate::core::reader::BitReader;
use crate::error::{CodecError, Result};

/// A message type with a bit-level wire form
pub trait Wire: Sized {
    fn encode<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<()>;

    fn decode<R: BitRead + ?Sized>(r: &mut R) -> Result<Self>;

    /// Encode into a fresh stream
    fn to_stream(&self) -> Result<BitStream> {
        let mut stream = BitStream::new();
        self.encode(&mut stream)?;
        Ok(stream)
    }

    /// Decode a whole datagram; fails when more than padding is left over
    fn from_wire_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(bytes);
        let value = Self::decode(&mut reader)?;
        if reader.payload_bits() >= 8 {
            return Err(CodecError::Malformed(format!(
                "{} trailing bits after message",
                reader.payload_bits()
            )));
        }
        Ok(value)
    }
}

impl<T: Primitive> Wire for T {
    #[inline]
    fn encode<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<()> {
        self.write_to(w);
        Ok(())
    }

    #[inline]
    fn decode<R: BitRead + ?Sized>(r: &mut R) -> Result<Self> {
        T::read_from(r)
    }
}

/// Which way a `serialize` call moves data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Write the field into the stream
    Encode,
    /// Overwrite the field from the stream
    Decode,
}

impl Direction {
    #[inline]
    pub fn is_encode(self) -> bool {
        self == Direction::Encode
    }
}

impl BitStream {
    pub fn serialize<T: Wire>(&mut self, dir: Direction, value: &mut T) -> Result<()> {
        match dir {
            Direction::Encode => value.encode(self),
            Direction::Decode => {
                *value = T::decode(self)?;
                Ok(())
            }
        }
    }

    pub fn serialize_mini<T: Mini>(&mut self, dir: Direction, value: &mut T) -> Result<()> {
        match dir {
            Direction::Encode => self.write_mini(*value),
            Direction::Decode => {
                *value = self.read_mini()?;
                Ok(())
            }
        }
    }

    /// Changed-value form against `last`; on decode returns whether `value`
    /// was updated
    pub fn serialize_changed<T: Primitive>(
        &mut self,
        dir: Direction,
        value: &mut T,
        last: T,
    ) -> Result<bool> {
        match dir {
            Direction::Encode => {
                self.write_changed(*value, last);
                Ok(T::DIRECT_DELTA || *value != last)
            }
            Direction::Decode => self.read_changed(value),
        }
    }

    /// [`BitStream::serialize_changed`] with a mini-encoded value
    pub fn serialize_mini_changed<T: Mini>(
        &mut self,
        dir: Direction,
        value: &mut T,
        last: T,
    ) -> Result<bool> {
        match dir {
            Direction::Encode => {
                self.write_mini_changed(*value, last)?;
                Ok(T::DIRECT_DELTA || *value != last)
            }
            Direction::Decode => self.read_mini_changed(value),
        }
    }

    /// `value` sent as the narrower wire type `S`
    pub fn serialize_casted<S: Integral, T: Integral>(
        &mut self,
        dir: Direction,
        value: &mut T,
    ) -> Result<()> {
        match dir {
            Direction::Encode => self.write_casted::<S, T>(*value),
            Direction::Decode => {
                *value = self.read_casted::<S, T>()?;
                Ok(())
            }
        }
    }

    pub fn serialize_ranged<T: Integral>(
        &mut self,
        dir: Direction,
        value: &mut T,
        min: T,
        max: T,
        allow_outside_range: bool,
    ) -> Result<()> {
        match dir {
            Direction::Encode => self.write_ranged(*value, min, max, allow_outside_range),
            Direction::Decode => {
                *value = self.read_ranged(min, max, allow_outside_range)?;
                Ok(())
            }
        }
    }

    pub fn serialize_ranged_float<F: Real>(
        &mut self,
        dir: Direction,
        value: &mut F,
        min: F,
        max: F,
    ) -> Result<()> {
        match dir {
            Direction::Encode => self.write_ranged_float(*value, min, max),
            Direction::Decode => {
                *value = self.read_ranged_float(min, max)?;
                Ok(())
            }
        }
    }

    pub fn serialize_normal_vector<F: Real>(&mut self, dir: Direction, v: &mut [F; 3]) -> Result<()> {
        match dir {
            Direction::Encode => self.write_normal_vector(*v),
            Direction::Decode => {
                *v = self.read_normal_vector()?;
                Ok(())
            }
        }
    }

    pub fn serialize_vector<F: Real>(&mut self, dir: Direction, v: &mut [F; 3]) -> Result<()> {
        match dir {
            Direction::Encode => self.write_vector(*v),
            Direction::Decode => {
                *v = self.read_vector()?;
                Ok(())
            }
        }
    }

    pub fn serialize_normal_quat<F: Real>(&mut self, dir: Direction, q: &mut [F; 4]) -> Result<()> {
        match dir {
            Direction::Encode => self.write_normal_quat(*q),
            Direction::Decode => {
                *q = self.read_normal_quat()?;
                Ok(())
            }
        }
    }

    pub fn serialize_orth_matrix<F: Real>(
        &mut self,
        dir: Direction,
        m: &mut [[F; 3]; 3],
    ) -> Result<()> {
        match dir {
            Direction::Encode => self.write_orth_matrix(*m),
            Direction::Decode => {
                *m = self.read_orth_matrix()?;
                Ok(())
            }
        }
    }

    /// The low `bits` bits of `value`, right-aligned
    pub fn serialize_bits(&mut self, dir: Direction, value: &mut [u8], bits: usize) -> Result<()> {
        match dir {
            Direction::Encode => {
                self.write_bits(value, bits, true);
                Ok(())
            }
            Direction::Decode => self.read_bits(value, bits, true),
        }
    }
}
