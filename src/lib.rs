//! # netbits
//!
//! Bit-granular binary serialization for game networking.
//!
//! Typed values are packed into a dense, MSB-first bit stream and decoded
//! back in the same order. On top of fixed-width primitives the crate offers
//! compression schemes that trade generality for bandwidth: changed-value
//! (delta) encoding, byte-truncated "mini" integers, range-bounded integers,
//! quantized floats and compressed unit vectors, quaternions and rotation
//! matrices.
//!
//! ## Quick Start
//! ```rust
//! use netbits::prelude::*;
//!
//! let mut stream = BitStream::new();
//! stream.write(true);
//! stream.write_ranged(105u32, 100, 120, false).unwrap();
//! stream.write_mini(300_000u32).unwrap();
//! stream.write_vector([0.6f32, 0.8, 0.0]).unwrap();
//!
//! let packet = stream.into_bytes();
//!
//! let mut reader = BitReader::new(&packet);
//! assert!(reader.read::<bool>().unwrap());
//! assert_eq!(reader.read_ranged(100u32, 120, false).unwrap(), 105);
//! assert_eq!(reader.read_mini::<u32>().unwrap(), 300_000);
//! let v = reader.read_vector::<f32>().unwrap();
//! assert!((v[0] - 0.6).abs() < 1e-4 && (v[1] - 0.8).abs() < 1e-4);
//! ```
//!
//! ## Modules
//! - [`core`]: streams, cursors, raw bit I/O and primitive encoding
//! - [`compression`]: mini, delta, ranged and geometric codecs
//! - [`config`]: TOML/env configuration
//! - [`error`]: [`CodecError`](error::CodecError) and the `Result` alias
//! - [`utils`]: metrics, logging, stream pool and debug dumps
//!
//! ## Streams
//! [`BitStream`](core::buffer::BitStream) owns its buffer and can be both
//! written and read. [`BitReader`](core::reader::BitReader) borrows a received
//! packet and can only be read, so writing into borrowed memory does not
//! compile. Reading past the written payload is a recoverable
//! [`CodecError::InsufficientPayload`](error::CodecError::InsufficientPayload),
//! never undefined behaviour.

pub mod compression;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

/// Everything needed to encode and decode, in one import
pub mod prelude {
    pub use crate::compression::delta::{DeltaRead, DeltaWrite};
    pub use crate::compression::geometry::{GeometryRead, GeometryWrite};
    pub use crate::compression::mini::{Mini, MiniRead, MiniWrite};
    pub use crate::compression::ranged::{IntRange, RangedRead, RangedWrite};
    pub use crate::compression::Real;
    pub use crate::core::buffer::BitStream;
    pub use crate::core::io::{BitRead, BitWrite};
    pub use crate::core::primitive::{Integral, Primitive, PrimitiveRead, PrimitiveWrite, U24};
    pub use crate::core::reader::BitReader;
    pub use crate::core::serialization::{Direction, Wire};
    pub use crate::error::CodecError;
}
