//! Compressed vectors, quaternions and rotation matrices.
//!
//! ## Wire layouts
//! ```text
//! normal vector   [0][x:16][y:16][z:16]                  ranged over [-1, 1]
//!                 [1][axis:2][sign:1]                    (±1, 0, 0) and friends
//! vector          [magnitude:f32]([x][y][z] mini)        components only if |v| > 1e-5
//! normal quat     [sw][sx][sy][sz][|x|][|y|][|z|]        sign bits + mini u16 magnitudes
//! orth matrix     normal quat of the rotation
//! ```
//!
//! Components are `[x, y, z]` arrays and quaternions `[w, x, y, z]`. Matrices
//! are row-major, `m[row][col]`, and must be proper rotations for the
//! round-trip to hold.

use crate::compression::mini::{
    checked_unit, read_mini_integral, write_mini_integral, MiniRead, MiniWrite,
};
use crate::compression::ranged::{RangedRead, RangedWrite};
use crate::compression::Real;
use crate::core::io::{BitRead, BitWrite};
use crate::core::primitive::{PrimitiveRead, PrimitiveWrite};
use crate::error::{constants, CodecError, Result};

/// Magnitudes at or below this are sent as the zero vector
pub const MIN_MAGNITUDE: f32 = 1e-5;

const AXIS_EPSILON: f64 = 1e-4;
const OFF_AXIS_EPSILON: f64 = 1e-6;
const QUAT_STEPS: f64 = 65535.0;

/// `Some((axis, negative))` when `v` is a unit vector along a coordinate axis
fn axis_of(v: [f64; 3]) -> Option<(u8, bool)> {
    let axis = (0..3).find(|&i| (v[i].abs() - 1.0).abs() < AXIS_EPSILON)?;
    let others_zero = (0..3)
        .filter(|&i| i != axis)
        .all(|i| v[i].abs() < OFF_AXIS_EPSILON);
    others_zero.then_some((axis as u8, v[axis] < 0.0))
}

fn to_f64s<F: Real, const N: usize>(v: [F; N]) -> [f64; N] {
    v.map(Real::to_f64)
}

/// Renormalized `[w, x, y, z]` matrix of a unit quaternion
fn quat_to_matrix(q: [f64; 4]) -> [[f64; 3]; 3] {
    let len = q.iter().map(|c| c * c).sum::<f64>().sqrt();
    let [w, x, y, z] = if len > 0.0 {
        q.map(|c| c / len)
    } else {
        [1.0, 0.0, 0.0, 0.0]
    };

    [
        [
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - z * w),
            2.0 * (x * z + y * w),
        ],
        [
            2.0 * (x * y + z * w),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - x * w),
        ],
        [
            2.0 * (x * z - y * w),
            2.0 * (y * z + x * w),
            1.0 - 2.0 * (x * x + y * y),
        ],
    ]
}

/// Trace-based quaternion of a rotation matrix; negative radicands count as
/// zero
fn matrix_to_quat(m: [[f64; 3]; 3]) -> [f64; 4] {
    let half_root = |r: f64| r.max(0.0).sqrt() / 2.0;
    let w = half_root(1.0 + m[0][0] + m[1][1] + m[2][2]);
    let x = half_root(1.0 + m[0][0] - m[1][1] - m[2][2]);
    let y = half_root(1.0 - m[0][0] + m[1][1] - m[2][2]);
    let z = half_root(1.0 - m[0][0] - m[1][1] + m[2][2]);
    [
        w,
        x.copysign(m[2][1] - m[1][2]),
        y.copysign(m[0][2] - m[2][0]),
        z.copysign(m[1][0] - m[0][1]),
    ]
}

/// Geometric writes for every [`BitWrite`] implementor
pub trait GeometryWrite: BitWrite {
    /// A unit vector, 4 bits when it lies on a coordinate axis and 49 bits
    /// otherwise
    fn write_normal_vector<F: Real>(&mut self, v: [F; 3]) -> Result<()> {
        let v = to_f64s(v);
        for c in v {
            checked_unit(c)?;
        }

        if let Some((axis, negative)) = axis_of(v) {
            self.write_bit(true);
            self.write_bits(&[axis], 2, true);
            self.write_bit(negative);
            return Ok(());
        }

        self.write_bit(false);
        for c in v {
            self.write_ranged_float(c, -1.0, 1.0)?;
        }
        Ok(())
    }

    /// Any vector: its `f32` magnitude, then the mini-encoded direction
    fn write_vector<F: Real>(&mut self, v: [F; 3]) -> Result<()> {
        let v = to_f64s(v);
        let magnitude = v.iter().map(|c| c * c).sum::<f64>().sqrt();
        if !magnitude.is_finite() {
            return Err(CodecError::FloatOutOfRange(magnitude));
        }

        let wire_magnitude = magnitude as f32;
        if wire_magnitude.is_infinite() {
            return Err(CodecError::FloatOutOfRange(magnitude));
        }
        self.write(wire_magnitude);
        if wire_magnitude > MIN_MAGNITUDE {
            for c in v {
                self.write_mini(F::from_f64(c / magnitude))?;
            }
        }
        Ok(())
    }

    /// A unit quaternion `[w, x, y, z]`: four sign bits, then `|x|`, `|y|`
    /// and `|z|` as mini-encoded 16-bit fractions; `|w|` is implied
    fn write_normal_quat<F: Real>(&mut self, q: [F; 4]) -> Result<()> {
        let q = to_f64s(q);
        for c in q {
            checked_unit(c)?;
        }

        for c in q {
            self.write_bit(c < 0.0);
        }
        for c in &q[1..] {
            let fraction = (c.abs().min(1.0) * QUAT_STEPS).round() as u16;
            write_mini_integral(self, fraction);
        }
        Ok(())
    }

    /// A rotation matrix, sent as its quaternion
    fn write_orth_matrix<F: Real>(&mut self, m: [[F; 3]; 3]) -> Result<()> {
        let m = m.map(to_f64s::<F, 3>);
        for c in m.iter().flatten() {
            checked_unit(*c)?;
        }
        self.write_normal_quat(matrix_to_quat(m))
    }
}

impl<W: BitWrite + ?Sized> GeometryWrite for W {}

/// Geometric reads for every [`BitRead`] implementor
pub trait GeometryRead: BitRead {
    fn read_normal_vector<F: Real>(&mut self) -> Result<[F; 3]> {
        if self.read_bit()? {
            let mut axis = [0u8];
            self.read_bits(&mut axis, 2, true)?;
            let axis = axis[0] as usize;
            if axis > 2 {
                return Err(CodecError::Malformed(format!(
                    "{}: {axis}",
                    constants::ERR_AXIS_INDEX
                )));
            }
            let negative = self.read_bit()?;
            let mut v = [F::default(); 3];
            v[axis] = F::from_f64(if negative { -1.0 } else { 1.0 });
            return Ok(v);
        }

        let mut v = [0.0f64; 3];
        for c in &mut v {
            *c = self.read_ranged_float(-1.0, 1.0)?;
        }
        Ok(v.map(F::from_f64))
    }

    fn read_vector<F: Real>(&mut self) -> Result<[F; 3]> {
        let magnitude: f32 = self.read()?;
        if magnitude <= MIN_MAGNITUDE {
            return Ok([F::default(); 3]);
        }

        let magnitude = magnitude as f64;
        let mut v = [0.0f64; 3];
        for c in &mut v {
            *c = self.read_mini::<F>()?.to_f64() * magnitude;
        }
        Ok(v.map(F::from_f64))
    }

    fn read_normal_quat<F: Real>(&mut self) -> Result<[F; 4]> {
        let mut negative = [false; 4];
        for sign in &mut negative {
            *sign = self.read_bit()?;
        }

        let mut q = [0.0f64; 4];
        for c in &mut q[1..] {
            let fraction: u16 = read_mini_integral(self)?;
            *c = fraction as f64 / QUAT_STEPS;
        }
        q[0] = (1.0 - q[1] * q[1] - q[2] * q[2] - q[3] * q[3]).max(0.0).sqrt();

        for (c, negative) in q.iter_mut().zip(negative) {
            if negative {
                *c = -*c;
            }
        }
        Ok(q.map(F::from_f64))
    }

    fn read_orth_matrix<F: Real>(&mut self) -> Result<[[F; 3]; 3]> {
        let q = self.read_normal_quat::<f64>()?;
        Ok(quat_to_matrix(q).map(|row| row.map(F::from_f64)))
    }
}

impl<R: BitRead + ?Sized> GeometryRead for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffer::BitStream;

    fn assert_close<const N: usize>(actual: [f64; N], expected: [f64; N], tolerance: f64) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() <= tolerance, "{actual:?} vs {expected:?}");
        }
    }

    fn rotation_z(angle: f64) -> [[f64; 3]; 3] {
        let (s, c) = angle.sin_cos();
        [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]
    }

    fn rotation_x(angle: f64) -> [[f64; 3]; 3] {
        let (s, c) = angle.sin_cos();
        [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]]
    }

    fn multiply(a: [[f64; 3]; 3], b: [[f64; 3]; 3]) -> [[f64; 3]; 3] {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
            }
        }
        out
    }

    #[test]
    fn test_vector_0_6_0_8_0() {
        let mut stream = BitStream::new();
        stream.write_vector([0.6f32, 0.8, 0.0]).unwrap();
        let v = stream.read_vector::<f32>().unwrap();
        assert_close(v.map(f64::from), [0.6, 0.8, 0.0], 1e-4);
        stream.assert_consumed();
    }

    #[test]
    fn test_vector_keeps_magnitude() {
        let mut stream = BitStream::new();
        stream.write_vector([30.0f64, -40.0, 120.0]).unwrap();
        let v = stream.read_vector::<f64>().unwrap();
        assert_close(v, [30.0, -40.0, 120.0], 130.0 * 4.7e-10 * 2.0);
    }

    #[test]
    fn test_tiny_vector_is_zero() {
        let mut stream = BitStream::new();
        stream.write_vector([1e-7f32, 0.0, -1e-7]).unwrap();
        assert_eq!(stream.written_bits(), 32);
        assert_eq!(stream.read_vector::<f32>().unwrap(), [0.0; 3]);
    }

    #[test]
    fn test_non_finite_vector_rejected() {
        let mut stream = BitStream::new();
        assert!(stream.write_vector([f32::INFINITY, 0.0, 0.0]).is_err());
        assert!(stream.write_vector([f64::NAN, 0.0, 0.0]).is_err());
        assert_eq!(stream.written_bits(), 0);
    }

    #[test]
    fn test_vector_beyond_f32_range_rejected() {
        let mut stream = BitStream::new();
        assert!(matches!(
            stream.write_vector([1e39f64, 0.0, 0.0]),
            Err(CodecError::FloatOutOfRange(_))
        ));
        assert_eq!(stream.written_bits(), 0);

        stream.write_vector([3e38f64, 0.0, 0.0]).unwrap();
        let v = stream.read_vector::<f64>().unwrap();
        assert!(v.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_axis_aligned_normal_takes_four_bits() {
        let mut stream = BitStream::new();
        stream.write_normal_vector([0.0f32, -1.0, 0.0]).unwrap();
        stream.write_normal_vector([1.0f64, 0.0, 0.0]).unwrap();
        assert_eq!(stream.written_bits(), 8);
        assert_eq!(stream.read_normal_vector::<f32>().unwrap(), [0.0, -1.0, 0.0]);
        assert_eq!(stream.read_normal_vector::<f64>().unwrap(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_general_normal_vector() {
        let n = [0.267_261_24f64, 0.534_522_5, -0.801_783_7];
        let mut stream = BitStream::new();
        stream.write_normal_vector(n).unwrap();
        assert_eq!(stream.written_bits(), 49);
        assert_close(stream.read_normal_vector::<f64>().unwrap(), n, 1.6e-5);
    }

    #[test]
    fn test_normal_vector_rejects_large_components() {
        let mut stream = BitStream::new();
        assert!(matches!(
            stream.write_normal_vector([0.0f32, 2.0, 0.0]),
            Err(CodecError::FloatOutOfRange(_))
        ));
    }

    #[test]
    fn test_invalid_axis_index() {
        let mut stream = BitStream::new();
        stream.write_bit(true);
        stream.write_bits(&[3], 2, true);
        stream.write_bit(false);
        assert!(matches!(
            stream.read_normal_vector::<f32>(),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_normal_quat() {
        let half = std::f64::consts::FRAC_1_SQRT_2;
        let q = [0.5f64, -0.5, 0.5, -0.5];
        let mut stream = BitStream::new();
        stream.write_normal_quat(q).unwrap();
        stream.write_normal_quat([half, 0.0, 0.0, -half]).unwrap();

        assert_close(stream.read_normal_quat::<f64>().unwrap(), q, 1e-4);
        assert_close(
            stream.read_normal_quat::<f64>().unwrap(),
            [half, 0.0, 0.0, -half],
            1e-4,
        );
        stream.assert_consumed();
    }

    #[test]
    fn test_identity_quat_is_small() {
        let mut stream = BitStream::new();
        stream.write_normal_quat([1.0f32, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(stream.written_bits(), 4 + 3);
        assert_eq!(stream.read_normal_quat::<f32>().unwrap(), [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_orth_matrix_roundtrip() {
        let m = multiply(rotation_z(0.7), rotation_x(-1.9));
        let mut stream = BitStream::new();
        stream.write_orth_matrix(m).unwrap();
        let decoded = stream.read_orth_matrix::<f64>().unwrap();
        for (row, expected) in decoded.iter().zip(m) {
            assert_close(*row, expected, 5e-4);
        }
    }

    #[test]
    fn test_identity_matrix() {
        let identity = [[1.0f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let mut stream = BitStream::new();
        stream.write_orth_matrix(identity).unwrap();
        assert_eq!(stream.read_orth_matrix::<f32>().unwrap(), identity);
    }

    #[test]
    fn test_orth_matrix_rejects_bad_entries() {
        let mut stream = BitStream::new();
        let mut m = [[1.0f64, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        m[1][2] = f64::NAN;
        assert!(matches!(
            stream.write_orth_matrix(m),
            Err(CodecError::FloatOutOfRange(_))
        ));
        m[1][2] = 4.0;
        assert!(stream.write_orth_matrix(m).is_err());
        assert_eq!(stream.written_bits(), 0);
    }

    #[test]
    fn test_matrix_quat_agree() {
        let q = matrix_to_quat(rotation_z(1.0));
        // 1 + c - c - 1 may leave a rounding residue under the root
        assert_close(q, [(0.5f64).cos(), 0.0, 0.0, (0.5f64).sin()], 1e-7);
        let m = quat_to_matrix(q);
        for (row, expected) in m.iter().zip(rotation_z(1.0)) {
            assert_close(*row, expected, 1e-7);
        }
    }
}
