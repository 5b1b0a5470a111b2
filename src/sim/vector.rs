//! 2D vector helpers
//!
//! `Vector2` is glam's `DVec2`: a `Copy` value type, so every operation already
//! returns a fresh vector. glam covers add/sub/scale/dot/length/distance; the
//! operations that must refuse a zero-length input live on `Vector2Ext`.

use glam::DVec2;

use crate::error::GeometryError;

pub type Vector2 = DVec2;

/// Below this magnitude a vector is treated as zero
pub const ZERO_EPSILON: f64 = 1e-12;

pub trait Vector2Ext: Sized {
    /// Same direction, given length
    fn scale_to(self, length: f64) -> Result<Self, GeometryError>;

    /// Same direction, unit length
    fn unit(self) -> Result<Self, GeometryError>;

    /// Unsigned angle to `other` in radians, in [0, π]
    fn angle_with(self, other: Self) -> Result<f64, GeometryError>;
}

impl Vector2Ext for DVec2 {
    #[inline]
    fn scale_to(self, length: f64) -> Result<Self, GeometryError> {
        let magnitude = self.length();
        if magnitude <= ZERO_EPSILON || !magnitude.is_finite() {
            return Err(GeometryError::ZeroLength);
        }
        Ok(self * (length / magnitude))
    }

    #[inline]
    fn unit(self) -> Result<Self, GeometryError> {
        self.scale_to(1.0)
    }

    fn angle_with(self, other: Self) -> Result<f64, GeometryError> {
        let denom = self.length() * other.length();
        if denom <= ZERO_EPSILON {
            return Err(GeometryError::ZeroLength);
        }
        // Rounding can push the cosine a hair outside [-1, 1]
        Ok((self.dot(other) / denom).clamp(-1.0, 1.0).acos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_scale_to() {
        let v = Vector2::new(3.0, 4.0).scale_to(10.0).unwrap();
        assert!((v - Vector2::new(6.0, 8.0)).length() < 1e-12);
    }

    #[test]
    fn test_unit_of_zero_fails() {
        assert_eq!(Vector2::ZERO.unit(), Err(GeometryError::ZeroLength));
        assert_eq!(Vector2::ZERO.scale_to(2.0), Err(GeometryError::ZeroLength));
    }

    #[test]
    fn test_angle_with() {
        let a = Vector2::new(1.0, 0.0);
        let b = Vector2::new(0.0, 5.0);
        assert!((a.angle_with(b).unwrap() - FRAC_PI_2).abs() < 1e-12);
        assert!(a.angle_with(a * 3.0).unwrap().abs() < 1e-6);
        assert!(a.angle_with(Vector2::ZERO).is_err());
    }

    #[test]
    fn test_value_semantics() {
        let a = Vector2::new(1.0, 2.0);
        let b = a + Vector2::new(1.0, 1.0);
        assert_eq!(a, Vector2::new(1.0, 2.0));
        assert_eq!(b, Vector2::new(2.0, 3.0));
        assert_eq!(a.distance_squared(b), 2.0);
    }
}
