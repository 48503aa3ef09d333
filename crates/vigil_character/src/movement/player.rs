//! Player movement controller
//!
//! ```text
//!            crouch (fast)            jump
//!  Sliding ◄─────────────── Default ────────► ClimbingUp{Vault}
//!     │  timeout / airborne   ▲  │  └───────► ClimbingUp{StepUp}
//!     └───────────────────────┘  │ airborne, ledge at chest height
//!                         crouch ▼
//!                 Default ◄── Hanging ──jump──► ClimbingUp{Climb} ──done──► Default
//! ```
//!
//! Inputs are buffered by [`PlayerMovementController::set_inputs`] and the
//! motor drives everything else through [`CharacterController`].

use super::crouch::CrouchLatch;
use super::ledge::{Anchor, ClimbKind, LedgeProbe, LedgeScan};
use super::locomotion::{
    air_velocity, camera_planar_rotation, ground_velocity, reoriented_input, smoothed_rotation, JumpLatch,
};
use super::{FallRecoveryStatus, MovementView, PlayerMovementState};
use crate::animation::{AnimFlag, AnimationSink, Stance};
use crate::config::{FallConfig, GameConfig, JumpConfig, LedgeConfig, MovementConfig, SlideConfig};
use crate::input::InputFrame;
use std::sync::Arc;
use vigil_ai::{StateMachine, MAX_CHAINED_TRANSITIONS};
use vigil_math::{exp_smoothing, radians, Quat, Vec3};
use vigil_physics::{
    CharacterController, ColliderFilter, ColliderHandle, CollisionQuery, KinematicMotor, MotorContext, MotorHit,
    RaycastHit,
};

/// Movement policy for the player body
pub struct PlayerMovementController {
    machine: StateMachine<PlayerMovementState>,
    animator: Arc<dyn AnimationSink>,

    movement: MovementConfig,
    jump_config: JumpConfig,
    fall: FallConfig,
    slide: SlideConfig,
    ledge_config: LedgeConfig,

    inputs: InputFrame,
    move_input: Vec3,
    look_input: Vec3,
    walking: bool,
    must_walk: bool,

    jump: JumpLatch,
    crouch: CrouchLatch,
    grounded: bool,
    time_left_ground: f64,
    jump_start_y: f32,
    fall_recovery: FallRecoveryStatus,
    recovery_elapsed: f64,
    internal_velocity_add: Vec3,

    slide_velocity: Vec3,
    started_slide: bool,
    slide_stopped_at: Option<f64>,

    ledge: Option<LedgeProbe>,
    climb_kind: Option<ClimbKind>,
    anchor: Option<Anchor>,
    regrab_cooldown: f32,

    ignored: ColliderFilter,
}

impl PlayerMovementController {
    pub fn new(config: &GameConfig, animator: Arc<dyn AnimationSink>, now: f64) -> Self {
        Self {
            machine: StateMachine::new("PlayerMovement", PlayerMovementState::Default, now),
            animator,
            movement: config.movement.clone(),
            jump_config: config.jump.clone(),
            fall: config.fall.clone(),
            slide: config.slide.clone(),
            ledge_config: config.ledge.clone(),
            inputs: InputFrame::default(),
            move_input: Vec3::ZERO,
            look_input: Vec3::ZERO,
            walking: false,
            must_walk: false,
            jump: JumpLatch::default(),
            crouch: CrouchLatch::new(true),
            grounded: false,
            time_left_ground: now,
            jump_start_y: 0.0,
            fall_recovery: FallRecoveryStatus::None,
            recovery_elapsed: f64::INFINITY,
            internal_velocity_add: Vec3::ZERO,
            slide_velocity: Vec3::ZERO,
            started_slide: false,
            slide_stopped_at: None,
            ledge: None,
            climb_kind: None,
            anchor: None,
            regrab_cooldown: 0.0,
            ignored: ColliderFilter::new(),
        }
    }

    pub fn state(&self) -> PlayerMovementState {
        self.machine.current()
    }

    pub fn previous_state(&self) -> PlayerMovementState {
        self.machine.previous()
    }

    pub fn time_entered_state(&self) -> f64 {
        self.machine.entered_at()
    }

    pub fn time_since_entering_state(&self, now: f64) -> f32 {
        self.machine.time_in_state(now)
    }

    pub fn fall_recovery(&self) -> FallRecoveryStatus {
        self.fall_recovery
    }

    pub fn should_be_crouching(&self) -> bool {
        self.crouch.should_be_crouching()
    }

    pub fn is_walking(&self) -> bool {
        self.walking
    }

    pub fn is_slide_stopped(&self) -> bool {
        self.slide_stopped_at.is_some()
    }

    /// Traversal being played while in `ClimbingUp`
    pub fn climb_kind(&self) -> Option<ClimbKind> {
        self.climb_kind
    }

    pub fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    /// Colliders this character passes through
    pub fn ignored_colliders(&self) -> &ColliderFilter {
        &self.ignored
    }

    pub fn ignored_colliders_mut(&mut self) -> &mut ColliderFilter {
        &mut self.ignored
    }

    /// Force walking speed, used while charging an attack
    pub fn set_must_walk(&mut self, must_walk: bool) {
        self.must_walk = must_walk;
    }

    /// Impulse added at the end of the next default velocity update.
    /// Ignored outside `Default`.
    pub fn add_velocity(&mut self, velocity: Vec3) {
        if self.machine.is_in(PlayerMovementState::Default) {
            self.internal_velocity_add += velocity;
        }
    }

    /// Flip the crouch latch as a crouch press would
    pub fn toggle_crouch(&mut self, motor: &mut KinematicMotor) -> bool {
        self.crouch.toggle(motor, &*self.animator)
    }

    /// Buffer this tick's inputs and handle the edge-triggered transitions
    pub fn set_inputs(&mut self, inputs: &InputFrame, motor: &mut KinematicMotor, now: f64) {
        self.inputs = *inputs;

        let local = inputs.move_vector();
        let magnitude = local.length();
        self.animator.set_movement(if inputs.walk {
            magnitude * self.movement.walk_speed_percentage
        } else {
            magnitude
        });

        let planar = camera_planar_rotation(inputs.camera_rotation, motor.character_up());

        match self.machine.current() {
            PlayerMovementState::Default => {
                self.move_input = planar * local;
                self.look_input = self.move_input;

                if inputs.jump {
                    self.jump.request();
                }

                if inputs.crouch && motor.grounding().is_stable_on_ground {
                    if motor.velocity().length() >= self.slide.velocity_threshold {
                        self.transition(PlayerMovementState::Sliding, motor, now);
                    } else {
                        self.crouch.toggle(motor, &*self.animator);
                    }
                }

                let walking = inputs.walk || self.must_walk;
                if walking != self.walking {
                    self.animator.set_flag(AnimFlag::Walking, walking);
                }
                self.walking = walking;
            }
            PlayerMovementState::Sliding => {
                self.move_input = planar * local;
            }
            PlayerMovementState::Hanging => {
                self.move_input = Vec3::ZERO;
                if inputs.jump {
                    self.climb_kind = Some(ClimbKind::Climb);
                    self.transition(PlayerMovementState::ClimbingUp, motor, now);
                } else if inputs.crouch {
                    self.transition(PlayerMovementState::Default, motor, now);
                }
            }
            PlayerMovementState::ClimbingUp => {
                self.move_input = Vec3::ZERO;
            }
        }
    }

    fn transition(&mut self, to: PlayerMovementState, motor: &mut KinematicMotor, now: f64) {
        let mut next = Some(to);
        let mut chained = 0;
        while let Some(to) = next {
            let from = self.machine.current();
            self.on_exit(from, to, motor);
            self.machine.switch(to, now);
            self.on_enter(to, from, motor);

            chained += 1;
            if chained >= MAX_CHAINED_TRANSITIONS {
                self.machine.clear_requests();
            }
            next = self.machine.take_request();
        }
    }

    fn on_enter(&mut self, state: PlayerMovementState, _from: PlayerMovementState, motor: &mut KinematicMotor) {
        match state {
            PlayerMovementState::Default => {}
            PlayerMovementState::Sliding => {
                let direction = if self.move_input.is_near_zero() {
                    motor.velocity().horizontal().normalize_or_zero()
                } else {
                    self.move_input
                };
                self.slide_velocity = direction * self.slide.slide_speed;
                self.started_slide = true;
                self.slide_stopped_at = None;
                self.crouch.crouch(motor, &*self.animator);
                self.animator.set_flag(AnimFlag::Sliding, true);
            }
            PlayerMovementState::Hanging => {
                let Some(ledge) = self.ledge else {
                    log::warn!("Hanging entered without a ledge");
                    self.machine.request(PlayerMovementState::Default);
                    return;
                };
                let up = motor.character_up();
                self.anchor = Some(Anchor::new(
                    motor.position(),
                    motor.rotation(),
                    ledge.hang_position(motor.capsule().radius, self.ledge_config.hang_offset),
                    ledge.facing(up),
                    self.ledge_config.hang_anchor_time,
                ));
                self.begin_anchoring(motor);
                self.animator.set_flag(AnimFlag::Hanging, true);
            }
            PlayerMovementState::ClimbingUp => {
                let (Some(ledge), Some(kind)) = (self.ledge, self.climb_kind) else {
                    log::warn!("ClimbingUp entered without a ledge");
                    self.machine.request(PlayerMovementState::Default);
                    return;
                };
                let duration = match kind {
                    ClimbKind::Climb => self.ledge_config.climb_up_time,
                    ClimbKind::Vault => self.ledge_config.vault_time,
                    ClimbKind::StepUp => self.ledge_config.step_up_time,
                };
                self.anchor = Some(Anchor::new(
                    motor.position(),
                    motor.rotation(),
                    ledge.top_position(motor.capsule().radius),
                    ledge.facing(motor.character_up()),
                    duration,
                ));
                self.begin_anchoring(motor);
                self.animator.set_flag(climb_flag(kind), true);
            }
        }
    }

    fn on_exit(&mut self, state: PlayerMovementState, to: PlayerMovementState, motor: &mut KinematicMotor) {
        match state {
            PlayerMovementState::Default => {}
            PlayerMovementState::Sliding => {
                if !motor.grounding().is_stable_on_ground || !self.inputs.crouch_hold {
                    self.crouch.release();
                }
                self.slide_stopped_at = None;
                self.animator.set_flag(AnimFlag::Sliding, false);
            }
            PlayerMovementState::Hanging => {
                self.end_anchoring(motor);
                self.animator.set_flag(AnimFlag::Hanging, false);
                if to != PlayerMovementState::ClimbingUp {
                    self.ledge = None;
                    self.regrab_cooldown = self.ledge_config.regrab_cooldown;
                }
            }
            PlayerMovementState::ClimbingUp => {
                self.end_anchoring(motor);
                if let Some(kind) = self.climb_kind.take() {
                    self.animator.set_flag(climb_flag(kind), false);
                }
                self.ledge = None;
            }
        }
    }

    fn begin_anchoring(&mut self, motor: &mut KinematicMotor) {
        motor.set_collision_solving(false);
        motor.set_ground_solving(false);
        motor.set_velocity(Vec3::ZERO);
        self.jump.cancel();
        self.internal_velocity_add = Vec3::ZERO;
    }

    fn end_anchoring(&mut self, motor: &mut KinematicMotor) {
        self.anchor = None;
        motor.set_collision_solving(true);
        motor.set_ground_solving(true);
        motor.set_velocity(Vec3::ZERO);
    }

    /// Scan the ray ladder and find the ledge top above the wall `pick`
    /// selects
    fn find_ledge(
        &self,
        motor: &KinematicMotor,
        world: &dyn CollisionQuery,
        pick: fn(&LedgeScan) -> Option<RaycastHit>,
    ) -> Option<LedgeProbe> {
        let valid = |c: ColliderHandle| self.ignored.is_valid(c);
        let scan = LedgeScan::cast(motor, world, &valid, &self.ledge_config);
        let wall = pick(&scan)?;
        LedgeProbe::find(motor, world, &valid, &wall, &self.ledge_config)
    }

    /// Vault and step-up checks while walking into something
    fn detect_ground_traversal(&mut self, motor: &mut KinematicMotor, world: &dyn CollisionQuery, now: f64) {
        if !motor.grounding().is_stable_on_ground
            || self.is_recovering()
            || self.move_input.is_near_zero()
            || !self.inputs.is_forward_facing()
        {
            return;
        }

        let found = if self.jump.is_requested() {
            self.find_ledge(motor, world, LedgeScan::vault_wall)
                .map(|ledge| (ClimbKind::Vault, ledge))
        } else {
            None
        }
        .or_else(|| {
            self.find_ledge(motor, world, LedgeScan::step_wall)
                .map(|ledge| (ClimbKind::StepUp, ledge))
        });

        if let Some((kind, ledge)) = found {
            log::debug!("{:?} onto ledge at {:?}", kind, ledge.top);
            self.ledge = Some(ledge);
            self.climb_kind = Some(kind);
            self.transition(PlayerMovementState::ClimbingUp, motor, now);
        }
    }

    fn detect_hang(&mut self, motor: &mut KinematicMotor, world: &dyn CollisionQuery, now: f64) {
        if motor.grounding().is_stable_on_ground || self.regrab_cooldown > 0.0 {
            return;
        }
        if motor.velocity().dot(motor.character_up()) < -self.ledge_config.max_grab_fall_speed {
            return;
        }

        if let Some(ledge) = self.find_ledge(motor, world, LedgeScan::hang_wall) {
            log::debug!("Grabbed ledge at {:?}", ledge.top);
            self.ledge = Some(ledge);
            self.transition(PlayerMovementState::Hanging, motor, now);
        }
    }

    fn on_landed(&mut self, motor: &mut KinematicMotor) {
        self.animator.set_flag(AnimFlag::Jumping, false);

        if !self.machine.is_in(PlayerMovementState::Default) {
            return;
        }

        let fall_height = self.jump_start_y - motor.position().y;
        self.recovery_elapsed = 0.0;
        if fall_height < self.fall.recovery_threshold {
            return;
        }

        let (status, stance) = if fall_height >= self.fall.crouch_recovery_threshold {
            (FallRecoveryStatus::CrouchRecovering, Stance::CrouchRecovering)
        } else {
            (FallRecoveryStatus::Recovering, Stance::Recovering)
        };
        log::debug!("Landed from {:.2} m, {:?}", fall_height, status);
        self.fall_recovery = status;
        self.animator.set_stance(stance);

        if self.inputs.crouch_hold {
            self.crouch.crouch(motor, &*self.animator);
        }
    }

    fn on_leave_stable_ground(&mut self, motor: &mut KinematicMotor, now: f64) {
        self.time_left_ground = now;
        self.jump_start_y = motor.position().y;

        if self.machine.is_in(PlayerMovementState::Sliding) {
            self.transition(PlayerMovementState::Default, motor, now);
        }
    }

    fn update_fall_recovery(&mut self) {
        let limit = match self.fall_recovery {
            FallRecoveryStatus::None => return,
            FallRecoveryStatus::Recovering => self.fall.recovery_time,
            FallRecoveryStatus::CrouchRecovering => self.fall.crouch_recovery_time,
        };
        if self.recovery_elapsed >= f64::from(limit) {
            self.fall_recovery = FallRecoveryStatus::None;
            self.animator.set_stance(if self.crouch.is_crouching() {
                Stance::Crouching
            } else {
                Stance::Standing
            });
        }
    }
}

fn climb_flag(kind: ClimbKind) -> AnimFlag {
    match kind {
        ClimbKind::Climb => AnimFlag::ClimbingUp,
        ClimbKind::Vault => AnimFlag::Vaulting,
        ClimbKind::StepUp => AnimFlag::SteppingUp,
    }
}

impl CharacterController for PlayerMovementController {
    fn before_update(&mut self, ctx: &mut MotorContext<'_>, dt: f32) {
        match self.machine.current() {
            PlayerMovementState::Default => {
                if self.fall_recovery != FallRecoveryStatus::None {
                    self.recovery_elapsed += f64::from(dt);
                }
                self.regrab_cooldown = (self.regrab_cooldown - dt).max(0.0);
                self.detect_ground_traversal(ctx.motor, ctx.world, ctx.now);
            }
            PlayerMovementState::Sliding => {}
            PlayerMovementState::Hanging | PlayerMovementState::ClimbingUp => {
                if let Some(anchor) = &mut self.anchor {
                    anchor.advance(dt);
                }
            }
        }
    }

    fn post_grounding_update(&mut self, ctx: &mut MotorContext<'_>, _dt: f32) {
        let is_stable = ctx.motor.grounding().is_stable_on_ground;
        let was_stable = ctx.motor.last_grounding().is_stable_on_ground;
        self.grounded = is_stable;

        if is_stable && !was_stable {
            self.on_landed(ctx.motor);
        } else if !is_stable && was_stable {
            self.on_leave_stable_ground(ctx.motor, ctx.now);
        }
    }

    fn update_rotation(&mut self, ctx: &mut MotorContext<'_>, rotation: &mut Quat, dt: f32) {
        match self.machine.current() {
            PlayerMovementState::Default => {
                let gravity = self.movement.orient_towards_gravity.then_some(self.movement.gravity);
                *rotation = smoothed_rotation(
                    ctx.motor,
                    *rotation,
                    self.look_input,
                    self.movement.orientation_sharpness,
                    gravity,
                    dt,
                );
            }
            PlayerMovementState::Sliding => {}
            PlayerMovementState::Hanging | PlayerMovementState::ClimbingUp => {
                if let Some(anchor) = &self.anchor {
                    *rotation = anchor.rotation();
                }
            }
        }
    }

    fn update_velocity(&mut self, ctx: &mut MotorContext<'_>, velocity: &mut Vec3, dt: f32) {
        match self.machine.current() {
            PlayerMovementState::Default => {
                if self.is_recovering() {
                    self.move_input = Vec3::ZERO;
                    self.jump.cancel();
                }

                if ctx.motor.grounding().is_stable_on_ground {
                    let max_speed = self.movement.stable_speed(self.walking, self.crouch.is_crouching());
                    *velocity = ground_velocity(
                        ctx.motor,
                        *velocity,
                        self.move_input,
                        max_speed,
                        self.movement.stable_movement_sharpness,
                        dt,
                    );
                } else {
                    *velocity = air_velocity(ctx.motor, *velocity, self.move_input, &self.movement, dt);
                }

                let jump_speed = self.jump_config.jump_speed(self.movement.gravity.length());
                if self.jump.try_jump(
                    ctx.motor,
                    velocity,
                    jump_speed,
                    self.jump_config.allow_jumping_when_sliding,
                    self.jump_config.post_grounding_grace_time,
                    dt,
                ) {
                    self.animator.set_flag(AnimFlag::Jumping, true);
                }

                if self.internal_velocity_add.length_squared() > 0.0 {
                    *velocity += self.internal_velocity_add;
                    self.internal_velocity_add = Vec3::ZERO;
                }
            }
            PlayerMovementState::Sliding => {
                if self.slide_stopped_at.is_some() {
                    *velocity = velocity.lerp(Vec3::ZERO, exp_smoothing(self.movement.stable_movement_sharpness, dt));
                    *velocity += self.movement.gravity * dt;
                    return;
                }

                if self.started_slide {
                    *velocity = self.slide_velocity;
                    self.started_slide = false;
                }

                let ground_normal = ctx.motor.grounding().ground_normal;
                let steer = reoriented_input(self.move_input, ground_normal, ctx.motor.character_up());
                if !steer.is_near_zero() {
                    let speed = velocity.length();
                    let target = steer.normalize_or_zero() * speed;
                    *velocity = velocity.rotate_towards(target, radians(self.slide.rotation_speed), speed);
                    *velocity = velocity.lerp(target, exp_smoothing(self.slide.rotation_speed, dt));
                }
                *velocity = velocity.lerp(Vec3::ZERO, self.slide.decay);
                self.slide_velocity = *velocity;
            }
            PlayerMovementState::Hanging | PlayerMovementState::ClimbingUp => {
                *velocity = match &self.anchor {
                    Some(anchor) => anchor.velocity(ctx.motor.position(), dt),
                    None => Vec3::ZERO,
                };
            }
        }
    }

    fn after_update(&mut self, ctx: &mut MotorContext<'_>, dt: f32) {
        let now = ctx.now;
        match self.machine.current() {
            PlayerMovementState::Default => {
                let jumped_off_ground = self.jump.after_update(
                    ctx.motor,
                    self.jump_config.allow_jumping_when_sliding,
                    self.jump_config.pre_grounding_grace_time,
                    dt,
                );
                if jumped_off_ground && self.crouch.should_be_crouching() {
                    self.crouch.release();
                }

                self.update_fall_recovery();

                if !self.inputs.crouch_hold && self.crouch.should_be_crouching() {
                    self.crouch.release();
                }
                let valid = |c: ColliderHandle| self.ignored.is_valid(c);
                self.crouch.resolve_uncrouch(ctx.motor, ctx.world, &valid, &*self.animator);

                self.detect_hang(ctx.motor, ctx.world, now);
            }
            PlayerMovementState::Sliding => {
                let max_slide_time = f64::from(self.slide.max_slide_time);
                if self.slide_stopped_at.is_none() && self.machine.time_in_state(now) >= self.slide.max_slide_time {
                    self.slide_stopped_at = Some(self.machine.entered_at() + max_slide_time);
                }
                if let Some(stopped_at) = self.slide_stopped_at {
                    if now - stopped_at >= f64::from(self.slide.stopped_time) {
                        self.transition(PlayerMovementState::Default, ctx.motor, now);
                    }
                }
            }
            PlayerMovementState::Hanging => {}
            PlayerMovementState::ClimbingUp => {
                if self.anchor.map_or(true, |anchor| anchor.is_finished()) {
                    self.transition(PlayerMovementState::Default, ctx.motor, now);
                }
            }
        }
    }

    fn is_collider_valid_for_collisions(&self, collider: ColliderHandle) -> bool {
        self.ignored.is_valid(collider)
    }

    fn on_movement_hit(&mut self, ctx: &mut MotorContext<'_>, hit: &MotorHit) {
        if !self.machine.is_in(PlayerMovementState::Sliding) || self.slide_stopped_at.is_some() {
            return;
        }
        let heading = self.slide_velocity.normalize_or_zero();
        if !hit.stability.is_stable && (-hit.normal).dot(heading) > 0.5 {
            log::debug!("Slide stopped by {:?}", hit.collider);
            self.slide_stopped_at = Some(ctx.now);
        }
    }
}

impl MovementView for PlayerMovementController {
    fn movement_state(&self) -> PlayerMovementState {
        self.machine.current()
    }

    fn time_in_movement_state(&self, now: f64) -> f32 {
        self.machine.time_in_state(now)
    }

    fn is_grounded(&self) -> bool {
        self.grounded
    }

    fn time_since_grounded(&self, now: f64) -> f32 {
        if self.grounded {
            0.0
        } else {
            (now - self.time_left_ground).max(0.0) as f32
        }
    }

    fn is_crouching(&self) -> bool {
        self.crouch.is_crouching()
    }

    fn is_recovering(&self) -> bool {
        self.fall_recovery != FallRecoveryStatus::None
    }

    fn local_movement_is_forward_facing(&self) -> bool {
        self.inputs.is_forward_facing()
    }
}
