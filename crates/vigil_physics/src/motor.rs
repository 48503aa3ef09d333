//! Kinematic capsule motor
//!
//! The motor owns position and rotation. Every tick it calls back into a
//! [`CharacterController`] at fixed points:
//!
//! ```text
//! before_update
//! ground cast ──► on_ground_hit
//! post_grounding_update
//! update_rotation
//! update_velocity
//! sweep and slide ──► on_movement_hit (per blocking contact)
//! after_update
//! ```
//!
//! The velocity written in `update_velocity` is the intended velocity. The
//! realized velocity after the sweep can differ, the part pushing into a
//! blocking surface is removed.

use crate::config::MotorConfig;
use crate::controller::CharacterController;
use crate::error::Result;
use crate::query::{ColliderHandle, CollisionQuery, QueryFilter, CONTACT_OFFSET};
use crate::shape::CapsuleShape;
use vigil_math::{Quat, Ray, Vec3};

/// Height above the feet the ground cast starts from
const PROBE_LIFT: f32 = 0.05;
/// Sideways distance of the ledge rays from the ground contact
const LEDGE_RAY_OFFSET: f32 = 0.05;
/// How far below the ground contact the ledge rays look
const LEDGE_RAY_DEPTH: f32 = 0.25;
/// Contacts closer than this to the capsule axis are straight below it
const AXIS_TOLERANCE: f32 = 0.01;
/// Slide iterations per tick
const MAX_SLIDE_ITERATIONS: usize = 4;
/// Shorter moves are dropped
const MIN_MOVE: f32 = 1e-5;

/// Ground contact found by the ground cast this tick
///
/// `ground_normal` is the normal at the contact. When the contact sits on
/// an edge, `inner_ground_normal` is the surface on the character's side of
/// the contact and `outer_ground_normal` the one beyond it. Away from edges
/// all three match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundingStatus {
    pub found_any_ground: bool,
    pub is_stable_on_ground: bool,
    /// Standing on an edge with one stable side
    pub ledge_detected: bool,
    /// Moving off a ledge, the motor did not snap down to it
    pub snapping_prevented: bool,
    pub ground_normal: Vec3,
    pub inner_ground_normal: Vec3,
    pub outer_ground_normal: Vec3,
    pub ground_point: Vec3,
    pub ground_collider: Option<ColliderHandle>,
}

impl Default for GroundingStatus {
    fn default() -> Self {
        Self {
            found_any_ground: false,
            is_stable_on_ground: false,
            ledge_detected: false,
            snapping_prevented: false,
            ground_normal: Vec3::ZERO,
            inner_ground_normal: Vec3::ZERO,
            outer_ground_normal: Vec3::ZERO,
            ground_point: Vec3::ZERO,
            ground_collider: None,
        }
    }
}

/// Whether a contact counts as walkable ground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitStabilityReport {
    pub is_stable: bool,
}

/// Contact reported to the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorHit {
    pub collider: ColliderHandle,
    pub normal: Vec3,
    pub point: Vec3,
    pub stability: HitStabilityReport,
}

/// What a controller callback can see and touch during a tick
pub struct MotorContext<'a> {
    pub motor: &'a mut KinematicMotor,
    pub world: &'a dyn CollisionQuery,
    /// Simulation time of the tick, in seconds
    pub now: f64,
}

/// Reference integrator for capsule characters
#[derive(Debug, Clone)]
pub struct KinematicMotor {
    position: Vec3,
    rotation: Quat,
    velocity: Vec3,
    capsule: CapsuleShape,
    grounding: GroundingStatus,
    last_grounding: GroundingStatus,
    must_unground_time: f32,
    collision_solving: bool,
    ground_solving: bool,
    stable_threshold: f32,
    config: MotorConfig,
}

impl KinematicMotor {
    /// Create a motor with its feet at `position`
    pub fn new(position: Vec3, config: MotorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            capsule: CapsuleShape::STANDING,
            grounding: GroundingStatus::default(),
            last_grounding: GroundingStatus::default(),
            must_unground_time: 0.0,
            collision_solving: true,
            ground_solving: true,
            stable_threshold: config.stable_normal_threshold(),
            config,
        })
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Teleport the feet
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    /// Realized velocity of the last tick
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Overwrite the velocity outside of a tick
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    pub fn capsule(&self) -> CapsuleShape {
        self.capsule
    }

    pub fn config(&self) -> &MotorConfig {
        &self.config
    }

    pub fn grounding(&self) -> &GroundingStatus {
        &self.grounding
    }

    /// Grounding of the previous tick
    pub fn last_grounding(&self) -> &GroundingStatus {
        &self.last_grounding
    }

    pub fn character_up(&self) -> Vec3 {
        self.rotation.up()
    }

    pub fn character_forward(&self) -> Vec3 {
        self.rotation.forward()
    }

    pub fn character_right(&self) -> Vec3 {
        self.rotation.right()
    }

    /// Resize the capsule
    pub fn set_capsule_dimensions(&mut self, radius: f32, height: f32, offset: f32) -> Result<()> {
        self.capsule = CapsuleShape::new(radius, height, offset)?;
        Ok(())
    }

    /// Swap in an already validated shape
    pub fn set_capsule(&mut self, capsule: CapsuleShape) {
        self.capsule = capsule;
    }

    /// Skip ground probing and snapping for `unground_time` seconds
    pub fn force_unground(&mut self) {
        self.must_unground_time = self.config.unground_time;
        log::trace!("Motor forced off the ground for {}s", self.must_unground_time);
    }

    pub fn must_unground(&self) -> bool {
        self.must_unground_time > 0.0
    }

    /// When disabled, velocity is integrated without sweeping
    pub fn set_collision_solving(&mut self, enabled: bool) {
        self.collision_solving = enabled;
    }

    pub fn collision_solving(&self) -> bool {
        self.collision_solving
    }

    /// When disabled, the ground cast is skipped and the actor is airborne
    pub fn set_ground_solving(&mut self, enabled: bool) {
        self.ground_solving = enabled;
    }

    pub fn ground_solving(&self) -> bool {
        self.ground_solving
    }

    /// Whether `normal` counts as walkable
    pub fn is_stable_normal(&self, normal: Vec3) -> bool {
        normal.dot(self.character_up()) >= self.stable_threshold
    }

    /// Colliders on the collidable layers overlapping the capsule where it
    /// currently stands
    pub fn character_overlap(
        &self,
        world: &dyn CollisionQuery,
        valid: &dyn Fn(ColliderHandle) -> bool,
    ) -> Vec<ColliderHandle> {
        let filter = QueryFilter::new(self.config.collidable_layers).with_predicate(valid);
        world.overlap_capsule(&self.capsule, self.position, self.rotation, &filter)
    }

    /// Direction along a surface that keeps `direction`'s heading relative
    /// to the character up
    pub fn direction_tangent_to_surface(&self, direction: Vec3, surface_normal: Vec3) -> Vec3 {
        let direction_right = direction.cross(self.character_up());
        surface_normal.cross(direction_right).normalize_or_zero()
    }

    /// Advance one fixed tick
    pub fn tick<C>(&mut self, controller: &mut C, world: &dyn CollisionQuery, now: f64, dt: f32)
    where
        C: CharacterController + ?Sized,
    {
        controller.before_update(&mut MotorContext { motor: &mut *self, world, now }, dt);

        self.last_grounding = self.grounding;
        let ground_hit = self.probe_ground(&*controller, world, dt);
        if let Some(hit) = ground_hit {
            controller.on_ground_hit(&mut MotorContext { motor: &mut *self, world, now }, &hit);
        }

        controller.post_grounding_update(&mut MotorContext { motor: &mut *self, world, now }, dt);

        let mut rotation = self.rotation;
        controller.update_rotation(&mut MotorContext { motor: &mut *self, world, now }, &mut rotation, dt);
        self.rotation = rotation.normalize();

        let mut velocity = self.velocity;
        controller.update_velocity(&mut MotorContext { motor: &mut *self, world, now }, &mut velocity, dt);
        self.velocity = velocity;

        if self.collision_solving {
            for hit in self.sweep_and_slide(&*controller, world, dt) {
                controller.on_movement_hit(&mut MotorContext { motor: &mut *self, world, now }, &hit);
            }
        } else {
            self.position += self.velocity * dt;
        }

        controller.after_update(&mut MotorContext { motor: &mut *self, world, now }, dt);
    }

    fn probe_ground<C>(&mut self, controller: &C, world: &dyn CollisionQuery, dt: f32) -> Option<MotorHit>
    where
        C: CharacterController + ?Sized,
    {
        self.grounding = GroundingStatus::default();

        if self.must_unground_time > 0.0 {
            self.must_unground_time = (self.must_unground_time - dt).max(0.0);
            return None;
        }
        if !self.ground_solving {
            return None;
        }
        let up = self.character_up();
        if !self.last_grounding.is_stable_on_ground && self.velocity.dot(up) > 0.01 {
            return None;
        }

        let valid = |c: ColliderHandle| controller.is_collider_valid_for_collisions(c);
        let filter = QueryFilter::new(self.config.collidable_layers).with_predicate(&valid);
        let reach = PROBE_LIFT + self.config.ground_probe_distance;
        let hit = world.sweep_capsule(
            &self.capsule,
            self.position + up * PROBE_LIFT,
            self.rotation,
            -up,
            reach,
            &filter,
        )?;

        let mut status = GroundingStatus {
            found_any_ground: true,
            ground_normal: hit.normal,
            inner_ground_normal: hit.normal,
            outer_ground_normal: hit.normal,
            ground_point: hit.point,
            ground_collider: Some(hit.collider),
            ..GroundingStatus::default()
        };
        let mut is_stable = self.is_stable_normal(hit.normal);

        // Off-axis contacts may sit on an edge, look at both sides of it
        let toward_character = (self.position - hit.point).project_on_plane(up);
        if toward_character.length() > AXIS_TOLERANCE {
            let toward_character = toward_character.normalize_or_zero();
            let inner = self.ledge_ray(world, &filter, hit.point + toward_character * LEDGE_RAY_OFFSET);
            let outer = self.ledge_ray(world, &filter, hit.point - toward_character * LEDGE_RAY_OFFSET);
            let inner_stable = inner.is_some_and(|n| self.is_stable_normal(n));
            let outer_stable = outer.is_some_and(|n| self.is_stable_normal(n));
            status.inner_ground_normal = inner.unwrap_or(hit.normal);
            status.outer_ground_normal = outer.unwrap_or(hit.normal);

            if inner_stable != outer_stable {
                status.ledge_detected = true;
                is_stable = true;
                let open_side = if inner_stable { -toward_character } else { toward_character };
                let speed_off_ledge = self.velocity.dot(open_side);
                status.snapping_prevented =
                    speed_off_ledge > 0.0 && speed_off_ledge >= self.config.max_velocity_for_ledge_snap;
            }
        }
        status.is_stable_on_ground = is_stable;
        self.grounding = status;

        if is_stable && !status.snapping_prevented {
            // The cast stops a contact offset short of the surface
            let gap = CONTACT_OFFSET / hit.normal.dot(up).max(0.5);
            self.position -= up * (hit.distance + gap - PROBE_LIFT);
            if !self.last_grounding.is_stable_on_ground && self.velocity.dot(status.ground_normal) < 0.0 {
                self.velocity = self.velocity.project_on_plane(status.ground_normal);
            }
        }
        if status.snapping_prevented {
            log::trace!("Ledge snapping prevented at {:?}", hit.point);
        }

        Some(MotorHit {
            collider: hit.collider,
            normal: status.ground_normal,
            point: hit.point,
            stability: HitStabilityReport { is_stable },
        })
    }

    /// Normal of the ground below `point`, if any is close enough
    fn ledge_ray(&self, world: &dyn CollisionQuery, filter: &QueryFilter<'_>, point: Vec3) -> Option<Vec3> {
        let up = self.character_up();
        let ray = Ray::new(point + up * PROBE_LIFT, -up);
        world.raycast(&ray, PROBE_LIFT + LEDGE_RAY_DEPTH, filter).map(|hit| hit.normal)
    }

    /// Move by `velocity * dt`, sliding along everything in the way
    fn sweep_and_slide<C>(&mut self, controller: &C, world: &dyn CollisionQuery, dt: f32) -> Vec<MotorHit>
    where
        C: CharacterController + ?Sized,
    {
        let valid = |c: ColliderHandle| controller.is_collider_valid_for_collisions(c);
        let filter = QueryFilter::new(self.config.collidable_layers).with_predicate(&valid);
        let up = self.character_up();
        let grounded = self.grounding.is_stable_on_ground;

        let mut remaining = self.velocity * dt;
        let mut hits = Vec::new();

        for _ in 0..MAX_SLIDE_ITERATIONS {
            let distance = remaining.length();
            if distance < MIN_MOVE {
                break;
            }
            let direction = remaining / distance;

            let Some(hit) =
                world.sweep_capsule(&self.capsule, self.position, self.rotation, direction, distance, &filter)
            else {
                self.position += remaining;
                break;
            };

            self.position += direction * hit.distance;
            let is_stable = self.is_stable_normal(hit.normal);

            // Grounded characters do not climb steep surfaces, they treat
            // them as upright walls
            let mut obstruction = hit.normal;
            if grounded && !is_stable {
                let flat = hit.normal.project_on_plane(up).normalize_or_zero();
                if !flat.is_near_zero() {
                    obstruction = flat;
                }
            }

            remaining = (remaining - direction * hit.distance).project_on_plane(obstruction);
            if self.velocity.dot(obstruction) < 0.0 {
                self.velocity = self.velocity.project_on_plane(obstruction);
            }

            hits.push(MotorHit {
                collider: hit.collider,
                normal: hit.normal,
                point: hit.point,
                stability: HitStabilityReport { is_stable },
            });
        }

        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_invalid_config() {
        let config = MotorConfig::default().with_max_stable_slope(120.0);
        assert!(KinematicMotor::new(Vec3::ZERO, config).is_err());
    }

    #[test]
    fn test_set_capsule_dimensions_validates() {
        let mut motor = KinematicMotor::new(Vec3::ZERO, MotorConfig::default()).unwrap();
        assert!(motor.set_capsule_dimensions(0.3, 0.2, 0.1).is_err());
        assert_eq!(motor.capsule(), CapsuleShape::STANDING);
        motor.set_capsule_dimensions(0.3, 0.9, 0.45).unwrap();
        assert_eq!(motor.capsule(), CapsuleShape::CROUCHING);
    }

    #[test]
    fn test_direction_tangent_to_slope() {
        let motor = KinematicMotor::new(Vec3::ZERO, MotorConfig::default()).unwrap();
        let normal = Vec3::new(0.0, 1.0, -1.0).normalize_or_zero();
        let tangent = motor.direction_tangent_to_surface(Vec3::Z, normal);
        assert_relative_eq!(tangent.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(tangent.dot(normal), 0.0, epsilon = 1e-5);
        assert!(tangent.y > 0.0 && tangent.z > 0.0);
    }

    #[test]
    fn test_stable_normal_threshold() {
        let motor = KinematicMotor::new(Vec3::ZERO, MotorConfig::default()).unwrap();
        assert!(motor.is_stable_normal(Vec3::Y));
        assert!(!motor.is_stable_normal(Vec3::Z));
        let steep = Vec3::new(0.0, 0.3, 1.0).normalize_or_zero();
        assert!(!motor.is_stable_normal(steep));
    }
}
