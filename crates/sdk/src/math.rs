//! Payload math types
//!
//! Layout-compatible with the host's `Vector` and `QAngle` so they can be read
//! straight out of host memory. Only the handful of operations the overlays
//! need are provided.

use std::ops::{Add, Mul, Sub};

/// Three-component float vector (`Vector` in the host)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Pitch/yaw/roll in degrees (`QAngle` in the host)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QAngle {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector::new(0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, other: Vector) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Length ignoring the vertical component
    #[inline]
    pub fn length_2d(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f32) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_ops() {
        let a = Vector::new(3.0, 4.0, 12.0);
        assert_eq!(a.length(), 13.0);
        assert_eq!(a.length_2d(), 5.0);
        assert_eq!(a + Vector::new(1.0, 1.0, 1.0), Vector::new(4.0, 5.0, 13.0));
        assert_eq!(a - a, Vector::ZERO);
        assert_eq!(a * 2.0, Vector::new(6.0, 8.0, 24.0));
    }

    #[test]
    fn test_layout() {
        assert_eq!(std::mem::size_of::<Vector>(), 12);
        assert_eq!(std::mem::size_of::<QAngle>(), 12);
    }
}
