//! Quaternion for 3D rotations

use crate::vector::Vec3;
use core::ops::Mul;

/// Unit quaternion representing an orientation
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    /// Identity quaternion (no rotation)
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Create from axis and angle (radians)
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalize_or_zero();
        if axis.is_near_zero() {
            return Self::IDENTITY;
        }
        let (sin, cos) = (angle * 0.5).sin_cos();
        Self::new(axis.x * sin, axis.y * sin, axis.z * sin, cos)
    }

    /// Rotation about the X axis. Positive angles tip forward downward.
    #[inline]
    pub fn from_rotation_x(angle: f32) -> Self {
        let (sin, cos) = (angle * 0.5).sin_cos();
        Self::new(sin, 0.0, 0.0, cos)
    }

    /// Rotation about the up axis. Positive angles turn forward toward `+X`.
    #[inline]
    pub fn from_rotation_y(angle: f32) -> Self {
        let (sin, cos) = (angle * 0.5).sin_cos();
        Self::new(0.0, sin, 0.0, cos)
    }

    /// Orientation whose forward (`+Z`) is `forward` and whose up is as close
    /// to `up` as possible.
    pub fn look_rotation(forward: Vec3, up: Vec3) -> Self {
        let f = forward.normalize_or_zero();
        if f.is_near_zero() {
            return Self::IDENTITY;
        }
        let mut r = up.cross(f).normalize_or_zero();
        if r.is_near_zero() {
            r = f.any_orthogonal();
        }
        let u = f.cross(r);
        Self::from_basis(r, u, f)
    }

    /// Build from the images of the X, Y and Z axes (orthonormal)
    pub fn from_basis(right: Vec3, up: Vec3, forward: Vec3) -> Self {
        let (m00, m01, m02) = (right.x, up.x, forward.x);
        let (m10, m11, m12) = (right.y, up.y, forward.y);
        let (m20, m21, m22) = (right.z, up.z, forward.z);
        let trace = m00 + m11 + m22;

        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalize()
    }

    /// Shortest rotation taking direction `from` onto direction `to`
    pub fn from_rotation_arc(from: Vec3, to: Vec3) -> Self {
        let from = from.normalize_or_zero();
        let to = to.normalize_or_zero();
        let dot = from.dot(to);

        if dot > 0.99999 {
            return Self::IDENTITY;
        }
        if dot < -0.99999 {
            return Self::from_axis_angle(from.any_orthogonal(), core::f32::consts::PI);
        }

        let axis = from.cross(to);
        let s = ((1.0 + dot) * 2.0).sqrt();
        Self::new(axis.x / s, axis.y / s, axis.z / s, s * 0.5).normalize()
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
        } else {
            Self::IDENTITY
        }
    }

    /// Inverse of a unit quaternion
    #[inline]
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Angle in radians needed to rotate from `self` to `other`
    pub fn angle_to(self, other: Self) -> f32 {
        let dot = self.dot(other).abs().min(1.0);
        2.0 * dot.acos()
    }

    /// Spherical linear interpolation along the shortest arc
    pub fn slerp(self, other: Self, t: f32) -> Self {
        let mut dot = self.dot(other);
        let mut other = other;
        if dot < 0.0 {
            other = Self::new(-other.x, -other.y, -other.z, -other.w);
            dot = -dot;
        }
        dot = dot.min(1.0);

        if dot > 0.9995 {
            return Self::new(
                self.x + (other.x - self.x) * t,
                self.y + (other.y - self.y) * t,
                self.z + (other.z - self.z) * t,
                self.w + (other.w - self.w) * t,
            )
            .normalize();
        }

        let theta = dot.acos();
        let sin_theta = theta.sin();
        let s1 = ((1.0 - t) * theta).sin() / sin_theta;
        let s2 = (t * theta).sin() / sin_theta;
        Self::new(
            self.x * s1 + other.x * s2,
            self.y * s1 + other.y * s2,
            self.z * s1 + other.z * s2,
            self.w * s1 + other.w * s2,
        )
    }

    /// Rotate toward `target` by at most `max_radians`, landing exactly on it
    /// once within reach
    pub fn rotate_towards(self, target: Self, max_radians: f32) -> Self {
        let angle = self.angle_to(target);
        if angle <= max_radians || angle <= 1e-6 {
            return target;
        }
        self.slerp(target, max_radians / angle)
    }

    /// Rotate a vector
    #[inline]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    #[inline]
    pub fn forward(self) -> Vec3 {
        self.rotate(Vec3::Z)
    }

    #[inline]
    pub fn up(self) -> Vec3 {
        self.rotate(Vec3::Y)
    }

    #[inline]
    pub fn right(self) -> Vec3 {
        self.rotate(Vec3::X)
    }

    /// Heading of the forward vector around the up axis, in radians
    pub fn yaw(self) -> f32 {
        let f = self.forward();
        f.x.atan2(f.z)
    }
}

impl Mul for Quat {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Mul<Vec3> for Quat {
    type Output = Vec3;

    #[inline]
    fn mul(self, rhs: Vec3) -> Vec3 {
        self.rotate(rhs)
    }
}
