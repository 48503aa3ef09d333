//! # vigil_math
//!
//! Small math layer shared by the character, physics and AI crates.
//! `+Y` is up, `+Z` is forward, `+X` is right; angles are radians unless a
//! name says otherwise.

pub mod bounds;
pub mod quaternion;
pub mod ray;
pub mod vector;

pub use bounds::*;
pub use quaternion::*;
pub use ray::*;
pub use vector::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const TAU: f32 = PI * 2.0;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
    pub const EPSILON: f32 = 1e-6;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Frame-rate independent blend factor `1 - e^(-sharpness * dt)`
#[inline]
pub fn exp_smoothing(sharpness: f32, dt: f32) -> f32 {
    1.0 - (-sharpness * dt).exp()
}

/// Shortest signed difference `target - current` wrapped to `[-PI, PI]`
#[inline]
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let mut delta = (target - current) % consts::TAU;
    if delta > consts::PI {
        delta -= consts::TAU;
    } else if delta < -consts::PI {
        delta += consts::TAU;
    }
    delta
}

pub mod prelude {
    pub use crate::bounds::Aabb;
    pub use crate::quaternion::Quat;
    pub use crate::ray::Ray;
    pub use crate::vector::{Vec2, Vec3};
    pub use crate::{delta_angle, degrees, exp_smoothing, lerp, move_towards, radians};
}
