//! Range-bounded integers and floats.
//!
//! An integer known to lie in `[min, max]` only needs enough bits to count
//! from `min` to `max`:
//!
//! ```text
//! width = BITS - leading_zeros(max - min)        // ceil(log2(max - min + 1))
//! [100, 120]  -> 5 bits
//! [0, 255]    -> 8 bits
//! [7, 7]      -> 0 bits
//! ```
//!
//! The offset `value - min` goes out least significant byte first, with the
//! trailing partial byte right-aligned. When values may occasionally fall
//! outside the range, an escape bit precedes the offset; `1` means a
//! mini-encoded full value follows instead.
//!
//! Floats in `[min, max]` are quantized to 16 bits.

use crate::compression::mini::{read_mini_integral, write_mini_integral};
use crate::compression::Real;
use crate::core::io::{BitRead, BitWrite};
use crate::core::primitive::{Integral, PrimitiveRead, PrimitiveWrite};
use crate::error::{constants, CodecError, Result};
use crate::utils::metrics::global_metrics;
use tracing::trace;

/// Bits needed for any value in `[min, max]`; `min <= max` is assumed
#[inline]
pub fn required_bits<T: Integral>(min: T, max: T) -> u32 {
    T::BITS - max.wrapping_sub(min).unsigned_leading_zeros()
}

/// A validated integer range with its width computed once.
///
/// ```rust
/// use netbits::compression::ranged::IntRange;
///
/// let health = IntRange::new(0u16, 1000).unwrap();
/// assert_eq!(health.bits(), 10);
/// assert!(IntRange::new(5i32, 4).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntRange<T: Integral> {
    min: T,
    max: T,
    bits: u32,
}

impl<T: Integral> IntRange<T> {
    pub fn new(min: T, max: T) -> Result<Self> {
        if min > max {
            return Err(CodecError::InvalidRange(format!(
                "{}: [{min}, {max}]",
                constants::ERR_EMPTY_RANGE
            )));
        }
        Ok(Self {
            min,
            max,
            bits: required_bits(min, max),
        })
    }

    #[inline]
    pub fn min(&self) -> T {
        self.min
    }

    #[inline]
    pub fn max(&self) -> T {
        self.max
    }

    /// Encoded width of an in-range value, escape bit excluded
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    fn out_of_range(&self, value: T) -> CodecError {
        CodecError::out_of_range(value, self.min, self.max)
    }
}

fn check_float_range(min: f64, max: f64) -> Result<()> {
    // also rejects NaN bounds
    if min < max {
        Ok(())
    } else {
        Err(CodecError::InvalidRange(format!(
            "{}: [{min}, {max}]",
            constants::ERR_DEGENERATE_FLOAT_RANGE
        )))
    }
}

const FLOAT_STEPS: f64 = 65535.0;

/// Ranged writes for every [`BitWrite`] implementor
pub trait RangedWrite: BitWrite {
    /// Write `value` in the minimal width for `[min, max]`.
    ///
    /// With `allow_outside_range` an escape bit precedes the value and
    /// out-of-range values are sent in full; without it they are an error
    /// and nothing is written.
    fn write_ranged<T: Integral>(
        &mut self,
        value: T,
        min: T,
        max: T,
        allow_outside_range: bool,
    ) -> Result<()> {
        let range = IntRange::new(min, max)?;
        self.write_in_range(value, &range, allow_outside_range)
    }

    fn write_in_range<T: Integral>(
        &mut self,
        value: T,
        range: &IntRange<T>,
        allow_outside_range: bool,
    ) -> Result<()> {
        let inside = range.contains(value);
        if allow_outside_range {
            self.write_bit(!inside);
            if !inside {
                global_metrics().range_escape();
                trace!(%value, min = %range.min, max = %range.max, "Ranged value escaped");
                write_mini_integral(self, value);
                return Ok(());
            }
        } else if !inside {
            return Err(range.out_of_range(value));
        }

        let offset = value.wrapping_sub(range.min).to_le();
        self.write_bits(offset.as_ref(), range.bits as usize, true);
        Ok(())
    }

    /// 16-bit quantization of `value` over `[min, max]`, clamped
    fn write_ranged_float<F: Real>(&mut self, value: F, min: F, max: F) -> Result<()> {
        let (value, min, max) = (value.to_f64(), min.to_f64(), max.to_f64());
        check_float_range(min, max)?;
        if value.is_nan() {
            return Err(CodecError::FloatOutOfRange(value));
        }
        let scaled = (FLOAT_STEPS * (value - min) / (max - min)).round();
        let quantized = scaled.clamp(0.0, FLOAT_STEPS) as u16;
        self.write(quantized);
        Ok(())
    }
}

impl<W: BitWrite + ?Sized> RangedWrite for W {}

/// Ranged reads for every [`BitRead`] implementor
pub trait RangedRead: BitRead {
    fn read_ranged<T: Integral>(&mut self, min: T, max: T, allow_outside_range: bool) -> Result<T> {
        let range = IntRange::new(min, max)?;
        self.read_in_range(&range, allow_outside_range)
    }

    fn read_in_range<T: Integral>(&mut self, range: &IntRange<T>, allow_outside_range: bool) -> Result<T> {
        if allow_outside_range && self.read_bit()? {
            return read_mini_integral(self);
        }

        let mut offset = T::Bytes::default();
        self.read_bits(offset.as_mut(), range.bits as usize, true)?;
        let value = T::from_le(offset).wrapping_add(range.min);
        if !range.contains(value) {
            global_metrics().decode_error();
            return Err(range.out_of_range(value));
        }
        Ok(value)
    }

    fn read_ranged_float<F: Real>(&mut self, min: F, max: F) -> Result<F> {
        let (min, max) = (min.to_f64(), max.to_f64());
        check_float_range(min, max)?;
        let quantized: u16 = self.read()?;
        let value = min + (max - min) * (quantized as f64 / FLOAT_STEPS);
        Ok(F::from_f64(value.clamp(min, max)))
    }
}

impl<R: BitRead + ?Sized> RangedRead for R {}
