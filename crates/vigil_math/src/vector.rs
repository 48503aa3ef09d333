//! Vector types

use core::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// 2D vector, used for stick and look axes
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len > 1e-6 {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::ZERO
        }
    }

    /// Scale down to `max` length if longer, otherwise return unchanged
    #[inline]
    pub fn clamp_length_max(self, max: f32) -> Self {
        let len = self.length();
        if len > max && len > 0.0 {
            Self::new(self.x * max / len, self.y * max / len)
        } else {
            self
        }
    }
}

/// 3D vector
///
/// Conventions used across the workspace: `+Y` is up, `+Z` is forward and
/// `+X` is right.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);
    pub const NEG_X: Self = Self::new(-1.0, 0.0, 0.0);
    pub const NEG_Y: Self = Self::new(0.0, -1.0, 0.0);
    pub const NEG_Z: Self = Self::new(0.0, 0.0, -1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    #[inline]
    pub fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    #[inline]
    pub fn normalize_or_zero(self) -> Self {
        let len_sq = self.length_squared();
        if len_sq > 1e-10 {
            self / len_sq.sqrt()
        } else {
            Self::ZERO
        }
    }

    #[inline]
    pub fn is_near_zero(self) -> bool {
        self.length_squared() <= 1e-10
    }

    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    /// Component of `self` along `onto`
    #[inline]
    pub fn project_onto(self, onto: Self) -> Self {
        let len_sq = onto.length_squared();
        if len_sq <= 1e-10 {
            return Self::ZERO;
        }
        onto * (self.dot(onto) / len_sq)
    }

    /// `self` with its component along `normal` removed
    #[inline]
    pub fn project_on_plane(self, normal: Self) -> Self {
        self - self.project_onto(normal)
    }

    /// Same vector with the vertical component zeroed
    #[inline]
    pub fn horizontal(self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }

    #[inline]
    pub fn with_y(self, y: f32) -> Self {
        Self::new(self.x, y, self.z)
    }

    /// Unsigned angle in radians between two directions
    pub fn angle_between(self, other: Self) -> f32 {
        let denom = (self.length_squared() * other.length_squared()).sqrt();
        if denom <= 1e-10 {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(-1.0, 1.0).acos()
    }

    /// Some unit vector perpendicular to `self`
    pub fn any_orthogonal(self) -> Self {
        let candidate = if self.x.abs() < 0.9 { Self::X } else { Self::Y };
        self.cross(candidate).normalize_or_zero()
    }

    /// Spherical interpolation treating both vectors as directions with
    /// magnitudes. Direction sweeps along the great arc, length is lerped.
    pub fn slerp(self, other: Self, t: f32) -> Self {
        let len_a = self.length();
        let len_b = other.length();
        if len_a <= 1e-6 || len_b <= 1e-6 {
            return self.lerp(other, t);
        }
        let a = self / len_a;
        let b = other / len_b;
        let dot = a.dot(b).clamp(-1.0, 1.0);
        let theta = dot.acos() * t;
        let mut relative = (b - a * dot).normalize_or_zero();
        if relative.is_near_zero() {
            if dot > 0.0 {
                return a * crate::lerp(len_a, len_b, t);
            }
            relative = a.any_orthogonal();
        }
        let (sin, cos) = theta.sin_cos();
        (a * cos + relative * sin) * crate::lerp(len_a, len_b, t)
    }

    /// Rotate `self` toward `target` by at most `max_radians`, moving the
    /// magnitude toward the target's by at most `max_magnitude_delta`
    pub fn rotate_towards(self, target: Self, max_radians: f32, max_magnitude_delta: f32) -> Self {
        let len_a = self.length();
        let len_b = target.length();
        let new_len = crate::move_towards(len_a, len_b, max_magnitude_delta);
        if len_a <= 1e-6 || len_b <= 1e-6 {
            return target.normalize_or_zero() * new_len;
        }
        let angle = self.angle_between(target);
        if angle <= max_radians {
            return target / len_b * new_len;
        }
        let t = max_radians / angle;
        self.slerp(target, t).normalize_or_zero() * new_len
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline] fn add(self, rhs: Self) -> Self { Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z) }
}
impl Sub for Vec3 {
    type Output = Self;
    #[inline] fn sub(self, rhs: Self) -> Self { Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z) }
}
impl Mul<f32> for Vec3 {
    type Output = Self;
    #[inline] fn mul(self, rhs: f32) -> Self { Self::new(self.x * rhs, self.y * rhs, self.z * rhs) }
}
impl Mul<Vec3> for f32 {
    type Output = Vec3;
    #[inline] fn mul(self, rhs: Vec3) -> Vec3 { rhs * self }
}
impl Div<f32> for Vec3 {
    type Output = Self;
    #[inline] fn div(self, rhs: f32) -> Self { Self::new(self.x / rhs, self.y / rhs, self.z / rhs) }
}
impl Neg for Vec3 {
    type Output = Self;
    #[inline] fn neg(self) -> Self { Self::new(-self.x, -self.y, -self.z) }
}
impl AddAssign for Vec3 {
    #[inline] fn add_assign(&mut self, rhs: Self) { *self = *self + rhs; }
}
impl SubAssign for Vec3 {
    #[inline] fn sub_assign(&mut self, rhs: Self) { *self = *self - rhs; }
}
impl MulAssign<f32> for Vec3 {
    #[inline] fn mul_assign(&mut self, rhs: f32) { *self = *self * rhs; }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cross_is_right_handed() {
        let z = Vec3::X.cross(Vec3::Y);
        assert_relative_eq!(z.z, 1.0);
        // up x forward points right
        assert_relative_eq!(Vec3::Y.cross(Vec3::Z).x, 1.0);
    }

    #[test]
    fn test_project_on_plane() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        let p = v.project_on_plane(Vec3::Y);
        assert_relative_eq!(p.x, 3.0);
        assert_relative_eq!(p.y, 0.0);
    }

    #[test]
    fn test_slerp_halfway() {
        let mid = Vec3::X.slerp(Vec3::Z, 0.5);
        assert_relative_eq!(mid.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(mid.x, mid.z, epsilon = 1e-5);
    }

    #[test]
    fn test_slerp_opposite_directions_stays_unit() {
        let mid = Vec3::Z.slerp(Vec3::NEG_Z, 0.5);
        assert_relative_eq!(mid.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(mid.dot(Vec3::Z), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rotate_towards_limits_angle() {
        let v = Vec3::Z * 10.0;
        let r = v.rotate_towards(Vec3::X * 10.0, 0.1, 10.0);
        assert_relative_eq!(v.angle_between(r), 0.1, epsilon = 1e-4);
        assert_relative_eq!(r.length(), 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_clamp_length_max() {
        let v = Vec2::new(1.0, 1.0).clamp_length_max(1.0);
        assert_relative_eq!(v.length(), 1.0, epsilon = 1e-6);
        let short = Vec2::new(0.5, 0.0).clamp_length_max(1.0);
        assert_eq!(short, Vec2::new(0.5, 0.0));
    }
}
