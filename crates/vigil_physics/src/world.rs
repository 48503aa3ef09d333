//! Level collision world backed by rapier
//!
//! Level geometry and actor hurtboxes are parentless rapier colliders. All
//! queries run through a [`rapier::QueryPipeline`] that is refreshed after
//! every change. Hurtboxes are registered as owned boxes and moved every
//! tick with [`StaticWorld::set_bounds`].

use crate::error::{PhysicsError, Result};
use crate::layers::CollisionLayer;
use crate::query::{ColliderHandle, CollisionQuery, QueryFilter, RaycastHit, SweepHit, CONTACT_OFFSET};
use crate::shape::CapsuleShape;
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::parry::shape::{Capsule, Cuboid, Shape};
use rapier3d::prelude as rapier;
use std::collections::HashMap;
use std::fmt;
use vigil_math::{Aabb, Quat, Ray, Vec3};

/// A collider registered in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldCollider {
    pub handle: ColliderHandle,
    pub layer: CollisionLayer,
    /// Entity that receives hits on this collider
    pub owner: Option<u64>,
    raw: rapier::ColliderHandle,
}

/// Static level geometry and kinematic hurtboxes
pub struct StaticWorld {
    bodies: rapier::RigidBodySet,
    colliders: rapier::ColliderSet,
    islands: rapier::IslandManager,
    query_pipeline: rapier::QueryPipeline,
    entries: HashMap<ColliderHandle, WorldCollider>,
    next_handle: u32,
}

impl StaticWorld {
    pub fn new() -> Self {
        Self {
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            islands: rapier::IslandManager::new(),
            query_pipeline: rapier::QueryPipeline::new(),
            entries: HashMap::new(),
            next_handle: 0,
        }
    }

    /// Add an unowned axis-aligned box
    pub fn add_box(&mut self, bounds: Aabb, layer: CollisionLayer) -> ColliderHandle {
        self.insert(box_shape(bounds.half_extents()), bounds.center(), Quat::IDENTITY, layer, None)
    }

    /// Add a box that reports hits against `owner`
    pub fn add_owned_box(&mut self, bounds: Aabb, layer: CollisionLayer, owner: u64) -> ColliderHandle {
        self.insert(box_shape(bounds.half_extents()), bounds.center(), Quat::IDENTITY, layer, Some(owner))
    }

    /// Add a box rotated around its center. Ramps and slopes are built from
    /// these.
    pub fn add_oriented_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        layer: CollisionLayer,
    ) -> ColliderHandle {
        self.insert(box_shape(half_extents), center, rotation.normalize(), layer, None)
    }

    /// Flat ground slab whose top surface sits at `height`
    pub fn add_ground(&mut self, height: f32, half_extent: f32) -> ColliderHandle {
        self.add_box(
            Aabb::new(
                Vec3::new(-half_extent, height - 1.0, -half_extent),
                Vec3::new(half_extent, height, half_extent),
            ),
            CollisionLayer::ENVIRONMENT,
        )
    }

    fn insert(
        &mut self,
        shape: rapier::SharedShape,
        center: Vec3,
        rotation: Quat,
        layer: CollisionLayer,
        owner: Option<u64>,
    ) -> ColliderHandle {
        let handle = ColliderHandle(self.next_handle);
        self.next_handle += 1;

        let collider = rapier::ColliderBuilder::new(shape)
            .position(isometry(center, rotation))
            .sensor(layer == CollisionLayer::TRIGGERS)
            .collision_groups(rapier::InteractionGroups::new(
                rapier::Group::from_bits_truncate(layer.as_mask()),
                rapier::Group::ALL,
            ))
            .user_data(u128::from(handle.0))
            .build();
        let raw = self.colliders.insert(collider);
        self.entries.insert(handle, WorldCollider { handle, layer, owner, raw });
        self.query_pipeline.update(&self.colliders);

        log::trace!("Added collider {:?} on layer {}", handle, layer.0);
        handle
    }

    /// Move and resize a box collider
    pub fn set_bounds(&mut self, handle: ColliderHandle, bounds: Aabb) -> Result<()> {
        let raw = self.raw(handle)?;
        let collider = self.colliders.get_mut(raw).ok_or(PhysicsError::ColliderNotFound(handle))?;
        collider.set_shape(box_shape(bounds.half_extents()));
        collider.set_position(isometry(bounds.center(), Quat::IDENTITY));
        self.query_pipeline.update(&self.colliders);
        Ok(())
    }

    /// Remove a collider
    pub fn remove(&mut self, handle: ColliderHandle) -> Result<()> {
        let entry = self.entries.remove(&handle).ok_or(PhysicsError::ColliderNotFound(handle))?;
        self.colliders.remove(entry.raw, &mut self.islands, &mut self.bodies, false);
        self.query_pipeline.update(&self.colliders);
        Ok(())
    }

    pub fn get(&self, handle: ColliderHandle) -> Option<&WorldCollider> {
        self.entries.get(&handle)
    }

    /// World-space bounding box of a collider
    pub fn bounds(&self, handle: ColliderHandle) -> Option<Aabb> {
        let collider = self.colliders.get(self.entries.get(&handle)?.raw)?;
        let aabb = collider.compute_aabb();
        Some(Aabb::new(
            Vec3::new(aabb.mins.x, aabb.mins.y, aabb.mins.z),
            Vec3::new(aabb.maxs.x, aabb.maxs.y, aabb.maxs.z),
        ))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn raw(&self, handle: ColliderHandle) -> Result<rapier::ColliderHandle> {
        self.entries
            .get(&handle)
            .map(|entry| entry.raw)
            .ok_or(PhysicsError::ColliderNotFound(handle))
    }

    /// Run `query` with `filter` expressed as a rapier filter. Layers map to
    /// interaction groups, trigger volumes are sensors and always skipped.
    fn with_filter<R>(&self, filter: &QueryFilter<'_>, query: impl FnOnce(rapier::QueryFilter<'_>) -> R) -> R {
        let predicate = |_: rapier::ColliderHandle, collider: &rapier::Collider| {
            filter.predicate.map_or(true, |p| p(handle_of(collider)))
        };
        let groups = rapier::InteractionGroups::new(rapier::Group::ALL, rapier::Group::from_bits_truncate(filter.mask.0));
        query(rapier::QueryFilter::new().groups(groups).exclude_sensors().predicate(&predicate))
    }

    fn overlapping(
        &self,
        shape: &dyn Shape,
        pose: &rapier::Isometry<rapier::Real>,
        filter: &QueryFilter<'_>,
    ) -> Vec<ColliderHandle> {
        let mut found = Vec::new();
        self.with_filter(filter, |filter| {
            self.query_pipeline
                .intersections_with_shape(&self.bodies, &self.colliders, pose, shape, filter, |raw| {
                    if let Some(collider) = self.colliders.get(raw) {
                        found.push(handle_of(collider));
                    }
                    true
                });
        });
        found.sort();
        found
    }
}

impl Default for StaticWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StaticWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticWorld")
            .field("colliders", &self.entries.len())
            .field("next_handle", &self.next_handle)
            .finish_non_exhaustive()
    }
}

impl CollisionQuery for StaticWorld {
    fn raycast(&self, ray: &Ray, max_distance: f32, filter: &QueryFilter<'_>) -> Option<RaycastHit> {
        let rapier_ray = rapier::Ray::new(to_point(ray.origin), to_vector(ray.direction));
        let (raw, intersection) = self.with_filter(filter, |filter| {
            self.query_pipeline.cast_ray_and_get_normal(
                &self.bodies,
                &self.colliders,
                &rapier_ray,
                max_distance,
                true,
                filter,
            )
        })?;
        let collider = self.colliders.get(raw)?;

        Some(RaycastHit {
            collider: handle_of(collider),
            point: ray.at(intersection.time_of_impact),
            normal: from_vector(&intersection.normal),
            distance: intersection.time_of_impact,
        })
    }

    fn overlap_box(
        &self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        filter: &QueryFilter<'_>,
    ) -> Vec<ColliderHandle> {
        let shrunk = (half_extents.abs() - Vec3::splat(CONTACT_OFFSET)).max(Vec3::ZERO);
        let shape = Cuboid::new(to_vector(shrunk));
        self.overlapping(&shape, &isometry(center, rotation), filter)
    }

    fn overlap_capsule(
        &self,
        capsule: &CapsuleShape,
        position: Vec3,
        rotation: Quat,
        filter: &QueryFilter<'_>,
    ) -> Vec<ColliderHandle> {
        let radius = (capsule.radius - CONTACT_OFFSET).max(0.0);
        let shape = Capsule::new_y(capsule.half_segment(), radius);
        let pose = isometry(capsule.center_at(position, rotation.up()), rotation);
        self.overlapping(&shape, &pose, filter)
    }

    fn sweep_capsule(
        &self,
        capsule: &CapsuleShape,
        position: Vec3,
        rotation: Quat,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter<'_>,
    ) -> Option<SweepHit> {
        let shape = Capsule::new_y(capsule.half_segment(), capsule.radius);
        let pose = isometry(capsule.center_at(position, rotation.up()), rotation);
        let options = ShapeCastOptions {
            max_time_of_impact: max_distance,
            target_distance: CONTACT_OFFSET,
            stop_at_penetration: false,
            ..Default::default()
        };

        let (raw, hit) = self.with_filter(filter, |filter| {
            self.query_pipeline.cast_shape(
                &self.bodies,
                &self.colliders,
                &pose,
                &to_vector(direction),
                &shape,
                options,
                filter,
            )
        })?;
        let collider = self.colliders.get(raw)?;

        let mut normal = from_vector(&hit.normal1).normalize_or_zero();
        if normal.dot(direction) > 0.0 {
            normal = -normal;
        }
        Some(SweepHit {
            collider: handle_of(collider),
            distance: hit.time_of_impact,
            normal,
            point: Vec3::new(hit.witness1.x, hit.witness1.y, hit.witness1.z),
        })
    }

    fn owner_of(&self, collider: ColliderHandle) -> Option<u64> {
        self.entries.get(&collider).and_then(|c| c.owner)
    }
}

fn handle_of(collider: &rapier::Collider) -> ColliderHandle {
    ColliderHandle(collider.user_data as u32)
}

fn box_shape(half_extents: Vec3) -> rapier::SharedShape {
    let h = half_extents.abs();
    rapier::SharedShape::cuboid(h.x, h.y, h.z)
}

fn isometry(center: Vec3, rotation: Quat) -> rapier::Isometry<rapier::Real> {
    rapier::Isometry::from_parts(
        rapier::Translation::new(center.x, center.y, center.z),
        UnitQuaternion::from_quaternion(Quaternion::new(rotation.w, rotation.x, rotation.y, rotation.z)),
    )
}

fn to_point(v: Vec3) -> rapier::Point<rapier::Real> {
    rapier::Point::new(v.x, v.y, v.z)
}

fn to_vector(v: Vec3) -> rapier::Vector<rapier::Real> {
    rapier::Vector::new(v.x, v.y, v.z)
}

fn from_vector(v: &rapier::Vector<rapier::Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}
