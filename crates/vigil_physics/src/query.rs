//! Overlap, raycast and sweep queries

use crate::layers::{CollisionLayer, LayerMask};
use crate::shape::CapsuleShape;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use vigil_math::{Aabb, Quat, Ray, Vec3};

/// Opaque collider identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderHandle(pub u32);

/// Result of a raycast query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// Hit point in world space
    pub point: Vec3,
    /// Surface normal at hit point
    pub normal: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}

/// First contact of a capsule swept along a direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    pub collider: ColliderHandle,
    /// Travel allowed before the capsule comes within [`CONTACT_OFFSET`]
    /// of the collider
    pub distance: f32,
    /// Surface normal at the contact, facing the mover
    pub normal: Vec3,
    /// Contact point on the collider
    pub point: Vec3,
}

/// Gap kept between a swept capsule and what blocks it. Overlap queries
/// ignore contacts closer than this.
pub const CONTACT_OFFSET: f32 = 0.01;

/// Filter applied to every query
#[derive(Clone, Copy)]
pub struct QueryFilter<'a> {
    /// Layers that are considered
    pub mask: LayerMask,
    /// Extra per-collider check, `false` skips the collider
    pub predicate: Option<&'a dyn Fn(ColliderHandle) -> bool>,
}

impl<'a> QueryFilter<'a> {
    pub fn new(mask: LayerMask) -> Self {
        Self { mask, predicate: None }
    }

    /// Add a per-collider predicate
    pub fn with_predicate(mut self, predicate: &'a dyn Fn(ColliderHandle) -> bool) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Whether a collider on `layer` passes this filter
    pub fn accepts(&self, collider: ColliderHandle, layer: CollisionLayer) -> bool {
        self.mask.contains(layer) && self.predicate.map_or(true, |p| p(collider))
    }
}

impl Default for QueryFilter<'_> {
    fn default() -> Self {
        Self::new(LayerMask::ALL)
    }
}

/// Contact-reporting collision service consumed by the motor and the
/// character logic. Trigger volumes never show up in these queries.
pub trait CollisionQuery {
    /// Closest hit along a ray within `max_distance`
    fn raycast(&self, ray: &Ray, max_distance: f32, filter: &QueryFilter<'_>) -> Option<RaycastHit>;

    /// Colliders overlapping an oriented box
    fn overlap_box(&self, center: Vec3, half_extents: Vec3, rotation: Quat, filter: &QueryFilter<'_>)
        -> Vec<ColliderHandle>;

    /// Colliders overlapping a capsule with its feet at `position`, its
    /// axis along `rotation`'s up
    fn overlap_capsule(
        &self,
        capsule: &CapsuleShape,
        position: Vec3,
        rotation: Quat,
        filter: &QueryFilter<'_>,
    ) -> Vec<ColliderHandle>;

    /// First blocking contact when the capsule moves up to `max_distance`
    /// along the unit `direction`. Contacts the capsule is already resting
    /// on or moving away from do not block.
    fn sweep_capsule(
        &self,
        capsule: &CapsuleShape,
        position: Vec3,
        rotation: Quat,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter<'_>,
    ) -> Option<SweepHit>;

    /// Entity that owns a collider, if any
    fn owner_of(&self, collider: ColliderHandle) -> Option<u64>;

    /// Colliders overlapping an axis-aligned box
    fn overlap_aabb(&self, bounds: &Aabb, filter: &QueryFilter<'_>) -> Vec<ColliderHandle> {
        self.overlap_box(bounds.center(), bounds.half_extents(), Quat::IDENTITY, filter)
    }
}

/// Set of colliders a character never collides with (usually its own)
#[derive(Debug, Clone, Default)]
pub struct ColliderFilter {
    ignored: HashSet<ColliderHandle>,
}

impl ColliderFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore(&mut self, collider: ColliderHandle) {
        self.ignored.insert(collider);
    }

    pub fn stop_ignoring(&mut self, collider: ColliderHandle) {
        self.ignored.remove(&collider);
    }

    /// `false` for ignored colliders
    pub fn is_valid(&self, collider: ColliderHandle) -> bool {
        !self.ignored.contains(&collider)
    }

    pub fn len(&self) -> usize {
        self.ignored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ignored.is_empty()
    }
}
