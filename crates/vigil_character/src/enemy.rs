//! Enemy body and agent
//!
//! [`EnemyMovementController`] is the walking half of the player controller
//! without sliding or ledges. [`EnemyAgent`] wires it to a motor, a status,
//! path steering and an optional [`PatrolGuard`] brain.

use crate::animation::{AnimFlag, AnimationSink};
use crate::config::EnemyConfig;
use crate::error::Result;
use crate::input::EnemyInputs;
use crate::movement::locomotion::{air_velocity, ground_velocity, smoothed_rotation};
use crate::movement::{CrouchLatch, JumpLatch};
use std::sync::Arc;
use vigil_ai::{GuardState, Observer, PathFollower, PathQuery, PatrolConfig, PatrolGuard, Perception, WorldServices};
use vigil_combat::{strike, DamageInfo, DamageKind, DamageSink, HealthEvent, HitRegistry, MeleeHitbox, Status};
use vigil_math::{Aabb, Quat, Vec3};
use vigil_physics::{
    CharacterController, ColliderFilter, ColliderHandle, CollisionQuery, KinematicMotor, MotorConfig, MotorContext,
};

/// Eye height above the feet used for perception
pub const ENEMY_EYE_HEIGHT: f32 = 1.6;
/// Horizontal distance at which the agent stops steering
pub const STOPPING_DISTANCE: f32 = 0.3;

/// Default-state-only movement policy for enemies
pub struct EnemyMovementController {
    config: EnemyConfig,
    animator: Arc<dyn AnimationSink>,

    move_input: Vec3,
    look_input: Vec3,

    jump: JumpLatch,
    crouch: CrouchLatch,
    jump_start_y: f32,
    recovering_until: Option<f64>,
    ignored: ColliderFilter,
}

impl EnemyMovementController {
    pub fn new(config: EnemyConfig, animator: Arc<dyn AnimationSink>) -> Self {
        Self {
            config,
            animator,
            move_input: Vec3::ZERO,
            look_input: Vec3::ZERO,
            jump: JumpLatch::default(),
            crouch: CrouchLatch::new(false),
            // Spawning onto the ground is not a landing
            jump_start_y: f32::NEG_INFINITY,
            recovering_until: None,
            ignored: ColliderFilter::new(),
        }
    }

    pub fn config(&self) -> &EnemyConfig {
        &self.config
    }

    pub fn should_be_crouching(&self) -> bool {
        self.crouch.should_be_crouching()
    }

    pub fn is_crouching(&self) -> bool {
        self.crouch.is_crouching()
    }

    /// Colliders this enemy passes through
    pub fn ignored_colliders(&self) -> &ColliderFilter {
        &self.ignored
    }

    pub fn ignored_colliders_mut(&mut self) -> &mut ColliderFilter {
        &mut self.ignored
    }

    /// Inside the post-landing lockout
    pub fn is_recovering_from_jump(&self, now: f64) -> bool {
        self.recovering_until.map_or(false, |until| now < until)
    }

    pub fn set_inputs(&mut self, inputs: &EnemyInputs, motor: &mut KinematicMotor) {
        let up = motor.character_up();
        let mut move_input = inputs.move_vector.project_on_plane(up);
        if move_input.length_squared() > 1.0 {
            move_input = move_input.normalize_or_zero();
        }
        self.move_input = move_input;
        self.animator.set_movement(move_input.length());

        self.look_input = match inputs.look_target {
            Some(target) => (target - motor.position()).project_on_plane(up).normalize_or_zero(),
            None => move_input.normalize_or_zero(),
        };

        if inputs.jump {
            self.jump.request();
        }
        if inputs.crouch {
            self.crouch.toggle(motor, &*self.animator);
        }
    }
}

impl CharacterController for EnemyMovementController {
    fn before_update(&mut self, _ctx: &mut MotorContext<'_>, _dt: f32) {}

    fn post_grounding_update(&mut self, ctx: &mut MotorContext<'_>, _dt: f32) {
        let is_stable = ctx.motor.grounding().is_stable_on_ground;
        let was_stable = ctx.motor.last_grounding().is_stable_on_ground;

        if is_stable && !was_stable {
            self.animator.set_flag(AnimFlag::Jumping, false);
            if ctx.motor.position().y - self.jump_start_y <= 0.0 {
                self.recovering_until = Some(ctx.now + f64::from(self.config.jump_recovery_time));
            }
        } else if !is_stable && was_stable {
            self.jump_start_y = ctx.motor.position().y;
        }
    }

    fn update_rotation(&mut self, ctx: &mut MotorContext<'_>, rotation: &mut Quat, dt: f32) {
        let movement = &self.config.movement;
        let gravity = movement.orient_towards_gravity.then_some(movement.gravity);
        *rotation = smoothed_rotation(ctx.motor, *rotation, self.look_input, movement.orientation_sharpness, gravity, dt);
    }

    fn update_velocity(&mut self, ctx: &mut MotorContext<'_>, velocity: &mut Vec3, dt: f32) {
        if self.is_recovering_from_jump(ctx.now) {
            self.move_input = Vec3::ZERO;
            self.jump.cancel();
        }

        let movement = &self.config.movement;
        if ctx.motor.grounding().is_stable_on_ground {
            let max_speed = movement.stable_speed(false, self.crouch.is_crouching());
            *velocity = ground_velocity(
                ctx.motor,
                *velocity,
                self.move_input,
                max_speed,
                movement.stable_movement_sharpness,
                dt,
            );
        } else {
            *velocity = air_velocity(ctx.motor, *velocity, self.move_input, movement, dt);
        }

        if self.jump.try_jump(
            ctx.motor,
            velocity,
            self.config.jump_speed,
            self.config.allow_jumping_when_sliding,
            self.config.post_grounding_grace_time,
            dt,
        ) {
            self.animator.set_flag(AnimFlag::Jumping, true);
        }
    }

    fn after_update(&mut self, ctx: &mut MotorContext<'_>, dt: f32) {
        let jumped_off_ground = self.jump.after_update(
            ctx.motor,
            self.config.allow_jumping_when_sliding,
            self.config.pre_grounding_grace_time,
            dt,
        );
        if jumped_off_ground && self.crouch.should_be_crouching() {
            self.crouch.release();
        }
        let valid = |c: ColliderHandle| self.ignored.is_valid(c);
        self.crouch.resolve_uncrouch(ctx.motor, ctx.world, &valid, &*self.animator);
    }

    fn is_collider_valid_for_collisions(&self, collider: ColliderHandle) -> bool {
        self.ignored.is_valid(collider)
    }
}

/// An enemy in the world
pub struct EnemyAgent {
    entity: u64,
    motor: KinematicMotor,
    controller: EnemyMovementController,
    status: Status,
    follower: PathFollower,
    brain: Option<PatrolGuard>,
    was_attacked: bool,
    hitbox: MeleeHitbox,
    melee_damage: f32,
}

impl EnemyAgent {
    pub fn new(
        entity: u64,
        position: Vec3,
        config: EnemyConfig,
        motor_config: MotorConfig,
        animator: Arc<dyn AnimationSink>,
    ) -> Result<Self> {
        let motor = KinematicMotor::new(position, motor_config)?;
        Ok(Self {
            entity,
            motor,
            status: Status::new(entity, config.max_health),
            melee_damage: config.melee_damage,
            controller: EnemyMovementController::new(config, animator),
            follower: PathFollower::new(),
            brain: None,
            was_attacked: false,
            hitbox: MeleeHitbox::enemy(),
        })
    }

    /// Give the agent a patrol route
    pub fn with_patrol(
        mut self,
        waypoints: Vec<Vec3>,
        config: PatrolConfig,
        services: Arc<WorldServices>,
        now: f64,
    ) -> Result<Self> {
        let name = format!("Guard{}", self.entity);
        self.brain = Some(PatrolGuard::new(name, waypoints, config, services, now)?);
        Ok(self)
    }

    pub fn entity(&self) -> u64 {
        self.entity
    }

    pub fn position(&self) -> Vec3 {
        self.motor.position()
    }

    pub fn rotation(&self) -> Quat {
        self.motor.rotation()
    }

    pub fn motor(&self) -> &KinematicMotor {
        &self.motor
    }

    pub fn controller(&self) -> &EnemyMovementController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut EnemyMovementController {
        &mut self.controller
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn brain(&self) -> Option<&PatrolGuard> {
        self.brain.as_ref()
    }

    pub fn guard_state(&self) -> Option<GuardState> {
        self.brain.as_ref().map(PatrolGuard::state)
    }

    pub fn was_attacked(&self) -> bool {
        self.was_attacked
    }

    pub fn is_dead(&self) -> bool {
        self.status.is_dead()
    }

    /// Eye position and facing for perception queries
    pub fn observer(&self) -> Observer {
        Observer::new(
            self.motor.position() + self.motor.character_up() * ENEMY_EYE_HEIGHT,
            self.motor.rotation(),
        )
    }

    /// Bounds of the body, for keeping a hurtbox in sync with the world
    pub fn hurtbox(&self) -> Aabb {
        self.motor.capsule().bounds_at(self.motor.position())
    }

    /// Send the brain back to its route once the alarm is clear
    pub fn stand_down(&mut self, now: f64) -> bool {
        self.brain.as_mut().map_or(false, |brain| brain.stand_down(now))
    }

    /// Steer towards the brain's destination, or straight at `target` for
    /// agents without a brain
    pub fn tick(
        &mut self,
        world: &dyn CollisionQuery,
        nav: &dyn PathQuery,
        perception: &dyn Perception,
        target: Option<Vec3>,
        now: f64,
        dt: f32,
    ) {
        let inputs = if self.status.is_dead() {
            EnemyInputs::default()
        } else {
            let position = self.motor.position();
            let (destination, look_target) = match &mut self.brain {
                Some(brain) => {
                    let observer = Observer::new(
                        position + self.motor.character_up() * ENEMY_EYE_HEIGHT,
                        self.motor.rotation(),
                    );
                    let output = brain.tick(&observer, target, perception, now, dt);
                    (output.destination, output.look_target)
                }
                None => (target.unwrap_or(position), target),
            };

            let move_vector = if (destination - position).horizontal().length() <= STOPPING_DISTANCE {
                Vec3::ZERO
            } else {
                self.follower.steer(nav, position, destination).horizontal().normalize_or_zero()
            };

            EnemyInputs {
                move_vector,
                look_target,
                ..Default::default()
            }
        };

        self.controller.set_inputs(&inputs, &mut self.motor);
        self.motor.tick(&mut self.controller, world, now, dt);
    }

    /// Take a hit and tell the brain about it
    pub fn receive_attack(&mut self, damage: &DamageInfo) -> Vec<HealthEvent> {
        let events = self.status.take_damage(damage);
        if events.is_empty() {
            return events;
        }
        self.was_attacked = true;
        if let Some(brain) = &mut self.brain {
            brain.notify_attacked(damage.hit_point);
        }
        events
    }

    /// Swing at whatever is in front. Every target is hit at most once.
    pub fn attack(&self, world: &dyn CollisionQuery, sink: &dyn DamageSink) -> Vec<u64> {
        if self.status.is_dead() {
            return Vec::new();
        }
        let damage = DamageInfo::new(self.melee_damage, DamageKind::Melee).with_source(self.entity);
        let mut hits = HitRegistry::new();
        strike(
            &self.hitbox,
            world,
            self.motor.position(),
            self.motor.rotation(),
            &damage,
            &mut hits,
            sink,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::RecordingAnimator;
    use vigil_combat::RecordingDamageSink;
    use vigil_physics::{CapsuleShape, CollisionLayer, StaticWorld};

    #[test]
    fn test_inputs_are_flattened_and_clamped() {
        let animator = Arc::new(RecordingAnimator::new());
        let mut controller = EnemyMovementController::new(EnemyConfig::default(), animator.clone());
        let mut motor = KinematicMotor::new(Vec3::ZERO, MotorConfig::default()).unwrap();

        let inputs = EnemyInputs {
            move_vector: Vec3::new(2.0, 3.0, 0.0),
            ..Default::default()
        };
        controller.set_inputs(&inputs, &mut motor);
        assert_eq!(controller.move_input, Vec3::X);
        assert_eq!(controller.look_input, Vec3::X);
        assert_eq!(animator.movement(), 1.0);
    }

    #[test]
    fn test_ignored_ceiling_does_not_hold_crouch() {
        const DT: f32 = 1.0 / 60.0;
        let mut world = StaticWorld::new();
        world.add_ground(0.0, 10.0);
        let animator = Arc::new(RecordingAnimator::new());
        let mut controller = EnemyMovementController::new(EnemyConfig::default(), animator.clone());
        let mut motor = KinematicMotor::new(Vec3::ZERO, MotorConfig::default()).unwrap();
        let toggle = EnemyInputs {
            crouch: true,
            ..Default::default()
        };

        controller.set_inputs(&toggle, &mut motor);
        motor.tick(&mut controller, &world, f64::from(DT), DT);
        assert!(controller.is_crouching());

        let ceiling = world.add_box(
            Aabb::new(Vec3::new(-1.0, 1.2, -1.0), Vec3::new(1.0, 1.5, 1.0)),
            CollisionLayer::ENVIRONMENT,
        );
        controller.set_inputs(&toggle, &mut motor);
        motor.tick(&mut controller, &world, 2.0 * f64::from(DT), DT);
        assert!(!controller.should_be_crouching());
        assert!(controller.is_crouching());
        assert_eq!(motor.capsule(), CapsuleShape::CROUCHING);

        controller.ignored_colliders_mut().ignore(ceiling);
        assert!(!controller.is_collider_valid_for_collisions(ceiling));
        controller.set_inputs(&EnemyInputs::default(), &mut motor);
        motor.tick(&mut controller, &world, 3.0 * f64::from(DT), DT);
        assert!(!controller.is_crouching());
        assert_eq!(motor.capsule(), CapsuleShape::STANDING);
        assert!(!animator.flag(AnimFlag::Crouching));
    }

    #[test]
    fn test_attack_hits_player_in_front() {
        let mut world = StaticWorld::new();
        world.add_owned_box(
            Aabb::new(Vec3::new(-0.3, 0.0, 0.4), Vec3::new(0.3, 1.8, 1.0)),
            CollisionLayer::PLAYER,
            1,
        );
        let agent = EnemyAgent::new(
            7,
            Vec3::ZERO,
            EnemyConfig::default(),
            MotorConfig::default(),
            Arc::new(RecordingAnimator::new()),
        )
        .unwrap();

        let sink = RecordingDamageSink::new();
        assert_eq!(agent.attack(&world, &sink), vec![1]);
        assert_eq!(sink.total_for(1), EnemyConfig::default().melee_damage);
    }
}
