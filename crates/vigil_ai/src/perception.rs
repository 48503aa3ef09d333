//! Perception queries

use serde::{Deserialize, Serialize};
use vigil_math::{radians, Quat, Ray, Vec3};
use vigil_physics::{CollisionQuery, LayerMask, QueryFilter};

/// Where a sensor sits and which way it faces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    /// Eye position
    pub position: Vec3,
    pub rotation: Quat,
}

impl Observer {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

/// Black-box detection service. Both queries are instantaneous.
pub trait Perception {
    /// Target inside the field of view and not occluded
    fn is_visible(&self, observer: &Observer, target: Vec3) -> bool;

    /// Target inside the sensing range, regardless of facing
    fn is_in_range(&self, observer: &Observer, target: Vec3) -> bool;
}

/// View cone with a range sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConeSensor {
    /// Full field of view in degrees
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    /// Distance the cone reaches
    #[serde(default = "default_view_distance")]
    pub view_distance: f32,
    /// Radius of the range sphere
    #[serde(default = "default_range")]
    pub range: f32,
}

fn default_fov() -> f32 { 90.0 }
fn default_view_distance() -> f32 { 12.0 }
fn default_range() -> f32 { 15.0 }

impl Default for ConeSensor {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov(),
            view_distance: default_view_distance(),
            range: default_range(),
        }
    }
}

impl ConeSensor {
    pub fn new(fov_degrees: f32, view_distance: f32, range: f32) -> Self {
        Self { fov_degrees, view_distance, range }
    }

    /// Same cone, with targets hidden behind geometry in `world`
    pub fn occluded_by<'w>(&self, world: &'w dyn CollisionQuery, blockers: LayerMask) -> OccludedSensor<'w> {
        OccludedSensor {
            cone: *self,
            world,
            blockers,
        }
    }

    fn in_cone(&self, observer: &Observer, target: Vec3) -> bool {
        let to_target = target - observer.position;
        let distance = to_target.length();
        if distance > self.view_distance {
            return false;
        }
        if distance <= 1e-4 {
            return true;
        }
        observer.rotation.forward().angle_between(to_target) <= radians(self.fov_degrees) * 0.5
    }
}

impl Perception for ConeSensor {
    fn is_visible(&self, observer: &Observer, target: Vec3) -> bool {
        self.in_cone(observer, target)
    }

    fn is_in_range(&self, observer: &Observer, target: Vec3) -> bool {
        observer.position.distance(target) <= self.range
    }
}

/// Cone sensor with a line-of-sight raycast
pub struct OccludedSensor<'w> {
    cone: ConeSensor,
    world: &'w dyn CollisionQuery,
    blockers: LayerMask,
}

impl OccludedSensor<'_> {
    fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        let delta = to - from;
        let distance = delta.length();
        if distance <= 1e-4 {
            return true;
        }
        let ray = Ray::new(from, delta);
        self.world
            .raycast(&ray, distance, &QueryFilter::new(self.blockers))
            .is_none()
    }
}

impl Perception for OccludedSensor<'_> {
    fn is_visible(&self, observer: &Observer, target: Vec3) -> bool {
        self.cone.in_cone(observer, target) && self.has_line_of_sight(observer.position, target)
    }

    fn is_in_range(&self, observer: &Observer, target: Vec3) -> bool {
        self.cone.is_in_range(observer, target)
    }
}
