//! # Core Stream Components
//!
//! Bit-granular buffers, cursors and fixed-width primitive encoding.
//!
//! ## Components
//! - **Cursor** ([`cursor`]): independent write/read bit positions
//! - **Bits** ([`bits`]): shift-and-mask copies between packed and caller bytes
//! - **Stream traits** ([`io`]): [`BitRead`](io::BitRead) and [`BitWrite`](io::BitWrite)
//! - **Owned stream** ([`buffer`]): growable [`BitStream`](buffer::BitStream)
//!   with an inline buffer for small messages
//! - **Borrowed stream** ([`reader`]): zero-copy, read-only [`BitReader`](reader::BitReader)
//! - **Primitives** ([`primitive`]): integers, booleans, floats, 24-bit
//!   integers and socket addresses
//! - **Serialization** ([`serialization`]): message-level `Wire` trait and
//!   direction-agnostic helpers
//!
//! ## Bit Order
//! ```text
//! byte:   |        0        |        1        |
//! bit:    | 0 1 2 3 4 5 6 7 | 8 9 ...         |
//!           ^ MSB of byte 0 is bit 0
//! ```
//! Bit numbering is MSB-first regardless of host byte order, and multi-byte
//! primitives are big-endian. Both are part of the wire contract.

pub mod bits;
pub mod buffer;
pub mod cursor;
pub mod io;
pub mod primitive;
pub mod reader;
pub mod serialization;
