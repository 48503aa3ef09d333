//! Ledge detection and anchored traversal
//!
//! Four forward rays at foot, knee, torso and head height classify what is
//! in front of the character. A downward ray just past the wall surface
//! then finds the top of the ledge. Hang, climb, vault and step-up all move
//! the character along an [`Anchor`] with collisions disabled.

use crate::config::LedgeConfig;
use serde::{Deserialize, Serialize};
use vigil_math::{Quat, Ray, Vec3};
use vigil_physics::{ColliderHandle, CollisionQuery, KinematicMotor, QueryFilter, RaycastHit};

/// How far past the wall surface the top probe is cast
const TOP_PROBE_INSET: f32 = 0.05;
/// Walls steeper than this count for the ladder, |normal . up|
const MAX_WALL_NORMAL_DOT: f32 = 0.2;

/// Which traversal an anchored climb is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimbKind {
    /// Pull up from a hang
    Climb,
    /// Hop over a waist-high obstacle
    Vault,
    /// Step onto a low obstacle
    StepUp,
}

/// Wall hits of the forward ray ladder
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LedgeScan {
    pub foot: Option<RaycastHit>,
    pub knee: Option<RaycastHit>,
    pub torso: Option<RaycastHit>,
    pub head: Option<RaycastHit>,
}

impl LedgeScan {
    /// Cast the ladder along the character forward
    pub fn cast(
        motor: &KinematicMotor,
        world: &dyn CollisionQuery,
        valid: &dyn Fn(ColliderHandle) -> bool,
        config: &LedgeConfig,
    ) -> Self {
        let up = motor.character_up();
        let forward = motor.character_forward();
        let filter = QueryFilter::new(motor.config().collidable_layers).with_predicate(valid);

        let wall_at = |height: f32| {
            let ray = Ray::new(motor.position() + up * height, forward);
            world
                .raycast(&ray, config.check_distance, &filter)
                .filter(|hit| hit.normal.dot(up).abs() <= MAX_WALL_NORMAL_DOT)
        };

        Self {
            foot: wall_at(config.foot_height),
            knee: wall_at(config.knee_height),
            torso: wall_at(config.torso_height),
            head: wall_at(config.head_height),
        }
    }

    /// Ledge between torso and head height
    pub fn hang_wall(&self) -> Option<RaycastHit> {
        match (self.torso, self.head) {
            (Some(wall), None) => Some(wall),
            _ => None,
        }
    }

    /// Obstacle between knee and torso height
    pub fn vault_wall(&self) -> Option<RaycastHit> {
        match (self.knee, self.torso) {
            (Some(wall), None) => Some(wall),
            _ => None,
        }
    }

    /// Obstacle between foot and knee height
    pub fn step_wall(&self) -> Option<RaycastHit> {
        match (self.foot, self.knee) {
            (Some(wall), None) => Some(wall),
            _ => None,
        }
    }
}

/// A detected ledge edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgeProbe {
    pub wall_point: Vec3,
    /// Points out of the wall, towards the character
    pub wall_normal: Vec3,
    /// Walkable point on top of the ledge, just past the edge
    pub top: Vec3,
}

impl LedgeProbe {
    /// Find the walkable top above a wall hit
    pub fn find(
        motor: &KinematicMotor,
        world: &dyn CollisionQuery,
        valid: &dyn Fn(ColliderHandle) -> bool,
        wall: &RaycastHit,
        config: &LedgeConfig,
    ) -> Option<Self> {
        let up = motor.character_up();
        let filter = QueryFilter::new(motor.config().collidable_layers).with_predicate(valid);

        let above = wall.point - wall.normal * TOP_PROBE_INSET;
        let origin = above.with_y(motor.position().y + config.head_height);
        let reach = config.head_height - config.foot_height;

        let hit = world.raycast(&Ray::new(origin, -up), reach, &filter)?;
        if hit.distance <= 1e-3 || !motor.is_stable_normal(hit.normal) {
            return None;
        }

        Some(Self {
            wall_point: wall.point,
            wall_normal: wall.normal.horizontal().normalize_or_zero(),
            top: hit.point,
        })
    }

    /// Rotation facing into the wall
    pub fn facing(&self, up: Vec3) -> Quat {
        Quat::look_rotation(-self.wall_normal, up)
    }

    /// Feet position while hanging from the edge
    pub fn hang_position(&self, radius: f32, hang_offset: f32) -> Vec3 {
        (self.wall_point + self.wall_normal * radius).with_y(self.top.y - hang_offset)
    }

    /// Feet position standing on top of the ledge
    pub fn top_position(&self, radius: f32) -> Vec3 {
        (self.top - self.wall_normal * radius).with_y(self.top.y)
    }
}

/// Timed interpolation from a start pose to a target pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub start_position: Vec3,
    pub start_rotation: Quat,
    pub target_position: Vec3,
    pub target_rotation: Quat,
    pub duration: f32,
    elapsed: f32,
}

impl Anchor {
    pub fn new(
        start_position: Vec3,
        start_rotation: Quat,
        target_position: Vec3,
        target_rotation: Quat,
        duration: f32,
    ) -> Self {
        Self {
            start_position,
            start_rotation,
            target_position,
            target_rotation,
            duration,
            elapsed: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Interpolation ratio, snapped near both ends
    pub fn ratio(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        let ratio = (self.elapsed / self.duration).clamp(0.0, 1.0);
        if ratio <= 0.01 {
            0.0
        } else if ratio >= 0.99 {
            1.0
        } else {
            ratio
        }
    }

    pub fn position(&self) -> Vec3 {
        self.start_position.lerp(self.target_position, self.ratio())
    }

    pub fn rotation(&self) -> Quat {
        self.start_rotation.slerp(self.target_rotation, self.ratio())
    }

    /// Velocity that lands exactly on the interpolated position this tick
    pub fn velocity(&self, current: Vec3, dt: f32) -> Vec3 {
        if dt <= 0.0 {
            return Vec3::ZERO;
        }
        (self.position() - current) / dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vigil_math::Aabb;
    use vigil_physics::{CollisionLayer, MotorConfig, StaticWorld};

    fn wall_world(top: f32) -> StaticWorld {
        let mut world = StaticWorld::new();
        world.add_ground(0.0, 20.0);
        world.add_box(
            Aabb::new(Vec3::new(-2.0, 0.0, 1.0), Vec3::new(2.0, top, 3.0)),
            CollisionLayer::ENVIRONMENT,
        );
        world
    }

    fn motor_at(y: f32) -> KinematicMotor {
        KinematicMotor::new(Vec3::new(0.0, y, 0.6), MotorConfig::default()).unwrap()
    }

    #[test]
    fn test_scan_classifies_heights() {
        let config = LedgeConfig::default();

        let knee_high = wall_world(0.9);
        let scan = LedgeScan::cast(&motor_at(0.0), &knee_high, &|_| true, &config);
        assert!(scan.vault_wall().is_some());
        assert!(scan.hang_wall().is_none());
        assert!(scan.step_wall().is_none());

        let ankle_high = wall_world(0.3);
        let scan = LedgeScan::cast(&motor_at(0.0), &ankle_high, &|_| true, &config);
        assert!(scan.step_wall().is_some());
    }

    #[test]
    fn test_probe_finds_top_past_edge() {
        let config = LedgeConfig::default();
        let world = wall_world(0.9);
        let motor = motor_at(0.0);
        let scan = LedgeScan::cast(&motor, &world, &|_| true, &config);
        let probe = LedgeProbe::find(&motor, &world, &|_| true, &scan.vault_wall().unwrap(), &config).unwrap();

        assert_relative_eq!(probe.top.y, 0.9, epsilon = 1e-4);
        assert!(probe.top.z > 1.0);
        assert_relative_eq!(probe.wall_normal.z, -1.0, epsilon = 1e-5);

        let standing = probe.top_position(0.3);
        assert_relative_eq!(standing.z, 1.35, epsilon = 1e-4);
        let hanging = probe.hang_position(0.3, 1.7);
        assert_relative_eq!(hanging.z, 0.7, epsilon = 1e-4);
        assert_relative_eq!(hanging.y, 0.9 - 1.7, epsilon = 1e-4);
    }

    #[test]
    fn test_anchor_snaps_at_extremes() {
        let mut anchor = Anchor::new(Vec3::ZERO, Quat::IDENTITY, Vec3::new(0.0, 2.0, 0.0), Quat::IDENTITY, 1.0);
        anchor.advance(0.005);
        assert_eq!(anchor.position(), Vec3::ZERO);

        anchor.advance(0.495);
        assert_relative_eq!(anchor.position().y, 1.0, epsilon = 1e-5);

        anchor.advance(0.495);
        assert_eq!(anchor.position(), Vec3::new(0.0, 2.0, 0.0));
        assert!(!anchor.is_finished());

        anchor.advance(0.1);
        assert!(anchor.is_finished());
        assert_eq!(anchor.velocity(Vec3::new(0.0, 2.0, 0.0), 0.1), Vec3::ZERO);
    }
}
