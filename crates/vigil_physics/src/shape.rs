//! Capsule shape descriptor

use crate::error::{PhysicsError, Result};
use serde::{Deserialize, Serialize};
use vigil_math::{Aabb, Vec3};

/// Upright capsule measured from the actor's feet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapsuleShape {
    pub radius: f32,
    pub height: f32,
    /// Height of the capsule center above the feet
    pub offset: f32,
}

impl CapsuleShape {
    /// Standing humanoid
    pub const STANDING: Self = Self { radius: 0.3, height: 1.8, offset: 0.9 };
    /// Crouched humanoid
    pub const CROUCHING: Self = Self { radius: 0.3, height: 0.9, offset: 0.45 };

    /// Create a capsule, rejecting degenerate dimensions
    pub fn new(radius: f32, height: f32, offset: f32) -> Result<Self> {
        if radius <= 0.0 || !radius.is_finite() {
            return Err(PhysicsError::InvalidCapsule(format!("radius must be positive, got {radius}")));
        }
        if height < radius * 2.0 || !height.is_finite() {
            return Err(PhysicsError::InvalidCapsule(format!(
                "height {height} is shorter than the capsule diameter {}",
                radius * 2.0
            )));
        }
        Ok(Self { radius, height, offset })
    }

    /// Half length of the segment between the two hemisphere centers
    pub fn half_segment(&self) -> f32 {
        (self.height * 0.5 - self.radius).max(0.0)
    }

    /// Capsule center for feet at `position` on an actor whose up is `up`
    pub fn center_at(&self, position: Vec3, up: Vec3) -> Vec3 {
        position + up * self.offset
    }

    /// Upright bounding box when the feet are at `position`, used for
    /// hurtboxes
    pub fn bounds_at(&self, position: Vec3) -> Aabb {
        let center = position + Vec3::Y * self.offset;
        Aabb::from_center_half_extents(center, Vec3::new(self.radius, self.height * 0.5, self.radius))
    }
}

impl Default for CapsuleShape {
    fn default() -> Self {
        Self::STANDING
    }
}
