//! # Compression Codecs
//!
//! Encodings that trade generality for bits on the wire.
//!
//! ## Codecs
//! - **Mini** ([`mini`]): byte-truncated integers, 16/32-bit fixed-point floats
//! - **Changed-value** ([`delta`]): presence bit, value only when it changed
//! - **Ranged** ([`ranged`]): minimal-width integers and 16-bit floats in `[min, max]`
//! - **Geometry** ([`geometry`]): unit vectors, vectors, quaternions and
//!   rotation matrices
//!
//! Every codec is an extension trait blanket-implemented for all
//! [`BitRead`](crate::core::io::BitRead) / [`BitWrite`](crate::core::io::BitWrite)
//! implementors, so bringing [`crate::prelude`] into scope is enough.
//!
//! ## Precision
//! | Encoding | Max error |
//! |----------|-----------|
//! | mini `f32` | 1.6e-5 |
//! | mini `f64` | 2.4e-10 (4.7e-10 at 1) |
//! | ranged float | `(max - min) / 131070` |
//! | normal vector | 1.6e-5 per component |
//! | normal quaternion | 7.7e-6 per x/y/z |

pub mod delta;
pub mod geometry;
pub mod mini;
pub mod ranged;

use crate::compression::mini::Mini;

/// Floating-point element type of the geometric codecs (`f32` or `f64`).
///
/// Arithmetic runs in `f64`; the element type only decides the width of
/// mini-encoded components.
pub trait Real: Mini + PartialOrd + Default {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

impl Real for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Real for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}
