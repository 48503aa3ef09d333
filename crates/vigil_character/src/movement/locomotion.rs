//! Ground, air and jump velocity shared by every walking character

use crate::config::MovementConfig;
use vigil_math::{exp_smoothing, Quat, Vec3};
use vigil_physics::{GroundingStatus, KinematicMotor};

/// Rotation whose forward is the camera heading flattened onto the
/// character plane. Looking straight down falls back to the camera up.
pub fn camera_planar_rotation(camera_rotation: Quat, up: Vec3) -> Quat {
    let mut planar = camera_rotation.forward().project_on_plane(up).normalize_or_zero();
    if planar.is_near_zero() {
        planar = camera_rotation.up().project_on_plane(up).normalize_or_zero();
    }
    if planar.is_near_zero() {
        return Quat::IDENTITY;
    }
    Quat::look_rotation(planar, up)
}

/// Ground normal to move along, picking the side we are heading to when
/// snapping was prevented on a ledge
pub fn effective_ground_normal(motor: &KinematicMotor, velocity: Vec3) -> Vec3 {
    let grounding: &GroundingStatus = motor.grounding();
    if velocity.length_squared() > 0.0 && grounding.snapping_prevented {
        let ground_to_character = motor.position() - grounding.ground_point;
        if velocity.dot(ground_to_character) >= 0.0 {
            return grounding.outer_ground_normal;
        }
        return grounding.inner_ground_normal;
    }
    grounding.ground_normal
}

/// Move input bent onto the ground plane, keeping its magnitude
pub fn reoriented_input(move_input: Vec3, ground_normal: Vec3, up: Vec3) -> Vec3 {
    let input_right = move_input.cross(up);
    ground_normal.cross(input_right).normalize_or_zero() * move_input.length()
}

/// Stable ground velocity smoothed towards `move_input * max_speed`
pub fn ground_velocity(
    motor: &KinematicMotor,
    velocity: Vec3,
    move_input: Vec3,
    max_speed: f32,
    sharpness: f32,
    dt: f32,
) -> Vec3 {
    let normal = effective_ground_normal(motor, velocity);
    let speed = velocity.length();
    let velocity = motor.direction_tangent_to_surface(velocity, normal) * speed;

    let target = reoriented_input(move_input, normal, motor.character_up()) * max_speed;
    velocity.lerp(target, exp_smoothing(sharpness, dt))
}

/// Airborne velocity with air control, gravity and drag
pub fn air_velocity(motor: &KinematicMotor, velocity: Vec3, move_input: Vec3, config: &MovementConfig, dt: f32) -> Vec3 {
    let mut velocity = velocity;

    if move_input.length_squared() > 0.0 {
        let mut target = move_input * config.max_air_move_speed;

        // Do not climb unstable slopes with air control
        let grounding = motor.grounding();
        if grounding.found_any_ground {
            let up = motor.character_up();
            let obstruction = up.cross(grounding.ground_normal).cross(up).normalize_or_zero();
            target = target.project_on_plane(obstruction);
        }

        let difference = (target - velocity).project_on_plane(config.gravity);
        velocity += difference * config.air_acceleration_speed * dt;
    }

    velocity += config.gravity * dt;
    velocity * (1.0 / (1.0 + config.drag * dt))
}

/// Turn the current forward towards `look` at an exponential rate,
/// optionally re-levelling against gravity
pub fn smoothed_rotation(
    motor: &KinematicMotor,
    rotation: Quat,
    look: Vec3,
    sharpness: f32,
    orient_towards_gravity: Option<Vec3>,
    dt: f32,
) -> Quat {
    let mut rotation = rotation;

    if !look.is_near_zero() && sharpness > 0.0 {
        let forward = motor
            .character_forward()
            .slerp(look.normalize_or_zero(), exp_smoothing(sharpness, dt))
            .normalize_or_zero();
        if !forward.is_near_zero() {
            rotation = Quat::look_rotation(forward, motor.character_up());
        }
    }

    if let Some(gravity) = orient_towards_gravity {
        rotation = Quat::from_rotation_arc(rotation.up(), -gravity) * rotation;
    }

    rotation
}

/// Jump request bookkeeping with grace windows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpLatch {
    requested: bool,
    consumed: bool,
    jumped_this_frame: bool,
    time_since_requested: f32,
    time_since_last_able: f32,
}

impl Default for JumpLatch {
    fn default() -> Self {
        Self {
            requested: false,
            consumed: false,
            jumped_this_frame: false,
            time_since_requested: f32::INFINITY,
            time_since_last_able: 0.0,
        }
    }
}

impl JumpLatch {
    pub fn request(&mut self) {
        self.requested = true;
        self.time_since_requested = 0.0;
    }

    /// Drop a pending request
    pub fn cancel(&mut self) {
        self.requested = false;
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    pub fn jumped_this_frame(&self) -> bool {
        self.jumped_this_frame
    }

    /// Apply a pending jump if the ground rules allow it. Returns true when
    /// the jump happened this call.
    pub fn try_jump(
        &mut self,
        motor: &mut KinematicMotor,
        velocity: &mut Vec3,
        speed: f32,
        allow_on_unstable: bool,
        post_grounding_grace: f32,
        dt: f32,
    ) -> bool {
        self.jumped_this_frame = false;
        self.time_since_requested += dt;

        if !self.requested || self.consumed {
            return false;
        }

        let grounding = *motor.grounding();
        let can_jump = if allow_on_unstable {
            grounding.found_any_ground
        } else {
            grounding.is_stable_on_ground
        };
        if !can_jump && self.time_since_last_able > post_grounding_grace {
            return false;
        }

        let up = motor.character_up();
        let direction = if grounding.found_any_ground && !grounding.is_stable_on_ground {
            grounding.ground_normal
        } else {
            up
        };

        motor.force_unground();
        *velocity += direction * speed - velocity.project_onto(up);
        self.requested = false;
        self.consumed = true;
        self.jumped_this_frame = true;
        true
    }

    /// End-of-tick bookkeeping. Returns true when a jump was made this tick
    /// from jumpable ground, which the owner uses to drop its crouch.
    pub fn after_update(
        &mut self,
        motor: &KinematicMotor,
        allow_on_unstable: bool,
        pre_grounding_grace: f32,
        dt: f32,
    ) -> bool {
        if self.requested && self.time_since_requested > pre_grounding_grace {
            self.requested = false;
        }

        let grounding = motor.grounding();
        let on_jumpable = if allow_on_unstable {
            grounding.found_any_ground
        } else {
            grounding.is_stable_on_ground
        };

        if on_jumpable {
            self.time_since_last_able = 0.0;
            if !self.jumped_this_frame {
                self.consumed = false;
                return false;
            }
            return true;
        }

        self.time_since_last_able += dt;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vigil_math::Aabb;
    use vigil_physics::{CharacterController, CollisionLayer, MotorConfig, MotorContext, StaticWorld};

    /// Keeps whatever velocity the motor already has
    struct Coast;

    impl CharacterController for Coast {
        fn before_update(&mut self, _ctx: &mut MotorContext<'_>, _dt: f32) {}
        fn post_grounding_update(&mut self, _ctx: &mut MotorContext<'_>, _dt: f32) {}
        fn update_rotation(&mut self, _ctx: &mut MotorContext<'_>, _rotation: &mut Quat, _dt: f32) {}
        fn update_velocity(&mut self, _ctx: &mut MotorContext<'_>, _velocity: &mut Vec3, _dt: f32) {}
        fn after_update(&mut self, _ctx: &mut MotorContext<'_>, _dt: f32) {}
    }

    #[test]
    fn test_camera_planar_rotation_ignores_pitch() {
        let camera = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2) * Quat::from_rotation_x(0.6);
        let planar = camera_planar_rotation(camera, Vec3::Y);
        assert_relative_eq!(planar.forward().x, 1.0, epsilon = 1e-4);
        assert_relative_eq!(planar.forward().y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_reoriented_input_follows_slope() {
        let slope = Vec3::new(0.0, 1.0, -1.0).normalize_or_zero();
        let bent = reoriented_input(Vec3::Z, slope, Vec3::Y);
        assert_relative_eq!(bent.length(), 1.0, epsilon = 1e-5);
        assert!(bent.y > 0.0);
    }

    #[test]
    fn test_leaving_ledge_moves_along_the_side_we_come_from() {
        let mut world = StaticWorld::new();
        world.add_ground(-5.0, 20.0);
        world.add_box(
            Aabb::new(Vec3::new(-2.0, -1.0, -4.0), Vec3::new(2.0, 0.0, 0.0)),
            CollisionLayer::ENVIRONMENT,
        );
        let mut motor = KinematicMotor::new(Vec3::new(0.0, 0.0, 0.1), MotorConfig::default()).unwrap();
        motor.set_velocity(Vec3::new(0.0, 0.0, 3.0));
        motor.tick(&mut Coast, &world, 0.0, 1.0 / 60.0);

        let grounding = *motor.grounding();
        assert!(grounding.snapping_prevented);
        assert!(grounding.ground_normal.y < 0.99);

        let off_edge = effective_ground_normal(&motor, Vec3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(off_edge.y, 1.0, epsilon = 1e-4);
        let back = effective_ground_normal(&motor, Vec3::new(0.0, 0.0, -3.0));
        assert_eq!(back, grounding.inner_ground_normal);

        // Launches flat instead of bending down around the edge
        let v = ground_velocity(&motor, Vec3::new(0.0, 0.0, 3.0), Vec3::Z, 3.0, 15.0, 1.0 / 60.0);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-4);
        assert!(v.z > 2.9);
    }

    #[test]
    fn test_air_velocity_applies_gravity_and_drag() {
        let motor = KinematicMotor::new(Vec3::ZERO, MotorConfig::default()).unwrap();
        let config = MovementConfig::default();
        let v = air_velocity(&motor, Vec3::ZERO, Vec3::ZERO, &config, 0.1);
        assert_relative_eq!(v.y, -2.5 / 1.01, epsilon = 1e-5);
    }

    #[test]
    fn test_request_expires_after_grace() {
        // Never grounded, so the motor reports no ground
        let mut motor = KinematicMotor::new(Vec3::ZERO, MotorConfig::default()).unwrap();
        let mut latch = JumpLatch::default();
        latch.after_update(&motor, true, 0.0, 0.1);
        latch.request();

        let mut velocity = Vec3::ZERO;
        assert!(!latch.try_jump(&mut motor, &mut velocity, 5.0, true, 0.0, 0.1));
        assert!(latch.is_requested());
        latch.after_update(&motor, true, 0.05, 0.1);
        assert!(!latch.is_requested());
        assert_eq!(velocity, Vec3::ZERO);
    }
}
