//! Callback contract between the motor and per-actor logic

use crate::motor::{MotorContext, MotorHit};
use crate::query::ColliderHandle;
use vigil_math::{Quat, Vec3};

/// Policy side of a [`KinematicMotor`](crate::motor::KinematicMotor)
///
/// Callbacks run once per tick in this order: `before_update`,
/// `on_ground_hit`, `post_grounding_update`, `update_rotation`,
/// `update_velocity`, `on_movement_hit`, `after_update`.
pub trait CharacterController {
    /// Bookkeeping before anything moves. Must not touch velocity or rotation.
    fn before_update(&mut self, ctx: &mut MotorContext<'_>, dt: f32);

    /// Grounding for this tick is known, `ctx.motor.last_grounding()` holds
    /// the previous one
    fn post_grounding_update(&mut self, ctx: &mut MotorContext<'_>, dt: f32);

    /// The only place rotation is written
    fn update_rotation(&mut self, ctx: &mut MotorContext<'_>, rotation: &mut Quat, dt: f32);

    /// The only place velocity is written. The value is the intended velocity,
    /// the realized one may differ after collision response.
    fn update_velocity(&mut self, ctx: &mut MotorContext<'_>, velocity: &mut Vec3, dt: f32);

    /// Timers, auto-transitions and deferred shape changes
    fn after_update(&mut self, ctx: &mut MotorContext<'_>, dt: f32);

    /// `false` makes the motor pass through `collider`
    fn is_collider_valid_for_collisions(&self, _collider: ColliderHandle) -> bool {
        true
    }

    /// Ground contact found by the ground cast
    fn on_ground_hit(&mut self, _ctx: &mut MotorContext<'_>, _hit: &MotorHit) {}

    /// Blocking contact during the sweep
    fn on_movement_hit(&mut self, _ctx: &mut MotorContext<'_>, _hit: &MotorHit) {}
}
