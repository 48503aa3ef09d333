//! Axis-aligned bounding boxes

use crate::vector::Vec3;

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let h = half_extents.abs();
        Self::new(center - h, center + h)
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }

    /// Overlap with positive volume. Boxes that only touch do not intersect.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        const SKIN: f32 = 1e-4;
        self.min.x < other.max.x - SKIN && self.max.x > other.min.x + SKIN
            && self.min.y < other.max.y - SKIN && self.max.y > other.min.y + SKIN
            && self.min.z < other.max.z - SKIN && self.max.z > other.min.z + SKIN
    }

    #[inline]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}
