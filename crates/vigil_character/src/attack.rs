//! Player attack state machine
//!
//! Runs after the movement controller every tick and only reads movement
//! through [`MovementView`]. Input is evaluated from `Idle` only, in this
//! priority order for primary fire:
//!
//! 1. throw a held object
//! 2. slide kick, shortly after a slide started
//! 3. jump kick, shortly after leaving the ground while moving forward
//! 4. start charging
//!
//! Secondary fire blocks, interact is handed to the [`Interaction`]
//! collaborator.

use crate::animation::{AnimFlag, AnimationSink};
use crate::config::AttackConfig;
use crate::input::InputFrame;
use crate::movement::{MovementView, PlayerMovementState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vigil_ai::{StateMachine, MAX_CHAINED_TRANSITIONS};
use vigil_combat::{DamageInfo, DamageKind, DamageSink, HitRegistry, MeleeHitbox};
use vigil_math::{lerp, Quat, Vec3};
use vigil_physics::CollisionQuery;

/// Attack states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAttackState {
    Idle,
    Blocking,
    BasicAttacking,
    ChargingAttack,
    ChargeAttacking,
    JumpKicking,
    SlideKicking,
}

/// Pick-up and use collaborator
pub trait Interaction {
    fn is_holding_object(&self) -> bool;

    /// Throw whatever is held
    fn throw_held(&mut self);

    /// Use whatever is in front of the player
    fn interact(&mut self);
}

/// Player with nothing to interact with
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInteraction;

impl Interaction for NoInteraction {
    fn is_holding_object(&self) -> bool {
        false
    }

    fn throw_held(&mut self) {}

    fn interact(&mut self) {}
}

/// Everything the attack machine looks at during its update
pub struct AttackContext<'a> {
    pub movement: &'a dyn MovementView,
    pub world: &'a dyn CollisionQuery,
    pub position: Vec3,
    pub rotation: Quat,
    pub damage: &'a dyn DamageSink,
    pub interaction: &'a mut dyn Interaction,
    pub now: f64,
}

/// Side effects of one attack update for the owner to apply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackOutcome {
    /// Forward impulse for the movement controller
    pub lunge: Option<Vec3>,
    /// Entities damaged this update
    pub struck: Vec<u64>,
}

/// Earliest time each attack kind may start again
#[derive(Debug, Clone, Copy, Default)]
struct Cooldowns {
    block: f64,
    basic: f64,
    jump_kick: f64,
    slide_kick: f64,
}

pub struct AttackController {
    entity: u64,
    config: AttackConfig,
    machine: StateMachine<PlayerAttackState>,
    animator: Arc<dyn AnimationSink>,
    hitbox: MeleeHitbox,
    hits: HitRegistry,
    inputs: InputFrame,
    charge: f32,
    block_input_handled: bool,
    ready_at: Cooldowns,
    variant: u32,
}

impl AttackController {
    /// Attack machine for `entity`, starting `Idle`
    pub fn new(entity: u64, config: AttackConfig, animator: Arc<dyn AnimationSink>, now: f64) -> Self {
        animator.reset_attack_parameters();
        Self {
            entity,
            config,
            machine: StateMachine::new("PlayerAttack", PlayerAttackState::Idle, now),
            animator,
            hitbox: MeleeHitbox::player(),
            hits: HitRegistry::new(),
            inputs: InputFrame::default(),
            charge: 0.0,
            block_input_handled: false,
            ready_at: Cooldowns::default(),
            variant: 0,
        }
    }

    pub fn with_hitbox(mut self, hitbox: MeleeHitbox) -> Self {
        self.hitbox = hitbox;
        self
    }

    pub fn state(&self) -> PlayerAttackState {
        self.machine.current()
    }

    pub fn previous_state(&self) -> PlayerAttackState {
        self.machine.previous()
    }

    pub fn time_entered_state(&self) -> f64 {
        self.machine.entered_at()
    }

    pub fn time_since_entering_state(&self, now: f64) -> f32 {
        self.machine.time_in_state(now)
    }

    /// Charge in [0, 1], reset whenever charging starts
    pub fn charge_percentage(&self) -> f32 {
        self.charge
    }

    pub fn damage_multiplier(&self) -> f32 {
        self.charge * self.config.max_charge_attack_damage_multiplier
    }

    pub fn is_charging(&self) -> bool {
        self.machine.is_in(PlayerAttackState::ChargingAttack)
    }

    pub fn block_input_handled(&self) -> bool {
        self.block_input_handled
    }

    /// Targets already hit by the current swing
    pub fn hits(&self) -> &HitRegistry {
        &self.hits
    }

    /// Buffer this tick's inputs. Nothing is evaluated until
    /// [`AttackController::post_update`].
    pub fn set_inputs(&mut self, inputs: &InputFrame) {
        self.inputs = *inputs;
    }

    /// Evaluate buffered input and advance timed states against this tick's
    /// final movement state
    pub fn post_update(&mut self, ctx: &mut AttackContext<'_>) -> AttackOutcome {
        let mut outcome = AttackOutcome::default();

        if !self.inputs.secondary_fire_hold {
            self.block_input_handled = false;
        }

        if self.machine.is_in(PlayerAttackState::Idle) && !ctx.movement.is_recovering() {
            if let Some(to) = self.evaluate_input(ctx) {
                self.transition(to, ctx, &mut outcome);
            }
        }

        self.update_state(ctx, &mut outcome);
        outcome
    }

    fn ready(&self, ready_at: f64, now: f64) -> bool {
        now >= ready_at
    }

    fn evaluate_input(&mut self, ctx: &mut AttackContext<'_>) -> Option<PlayerAttackState> {
        let now = ctx.now;
        let movement = ctx.movement;

        if self.inputs.primary_fire {
            if ctx.interaction.is_holding_object() {
                ctx.interaction.throw_held();
                return None;
            }

            if movement.movement_state() == PlayerMovementState::Sliding
                && movement.time_in_movement_state(now) <= self.config.slide_kick_allowance_time
                && self.ready(self.ready_at.slide_kick, now)
            {
                return Some(PlayerAttackState::SlideKicking);
            }

            if !movement.is_grounded()
                && movement.time_since_grounded(now) <= self.config.jump_kick_allowance_time
                && movement.local_movement_is_forward_facing()
                && self.ready(self.ready_at.jump_kick, now)
            {
                return Some(PlayerAttackState::JumpKicking);
            }

            if self.ready(self.ready_at.basic, now) {
                return Some(PlayerAttackState::ChargingAttack);
            }
        }

        if self.inputs.secondary_fire_hold && !self.block_input_handled && self.ready(self.ready_at.block, now) {
            return Some(PlayerAttackState::Blocking);
        }

        if self.inputs.interact {
            ctx.interaction.interact();
        }

        None
    }

    fn update_state(&mut self, ctx: &mut AttackContext<'_>, outcome: &mut AttackOutcome) {
        let elapsed = self.machine.time_in_state(ctx.now);

        match self.machine.current() {
            PlayerAttackState::Idle => {}
            PlayerAttackState::Blocking => {
                if elapsed >= self.config.block_motion_time {
                    self.transition(PlayerAttackState::Idle, ctx, outcome);
                }
            }
            PlayerAttackState::BasicAttacking => {
                if elapsed >= self.config.basic_attack_motion_time {
                    self.transition(PlayerAttackState::Idle, ctx, outcome);
                }
            }
            PlayerAttackState::ChargingAttack => {
                let charge = (elapsed / self.config.attack_fully_charged_motion_time).min(1.0);
                self.charge = self.charge.max(charge);
                self.animator.set_playback_speed(lerp(0.5, 1.0, self.charge));

                if !self.inputs.primary_fire_hold {
                    let to = if self.charge < self.config.charge_attack_minimum_charge_percentage {
                        PlayerAttackState::BasicAttacking
                    } else {
                        PlayerAttackState::ChargeAttacking
                    };
                    self.transition(to, ctx, outcome);
                }
            }
            PlayerAttackState::ChargeAttacking => {
                if elapsed >= self.config.charge_attack_motion_time {
                    self.transition(PlayerAttackState::Idle, ctx, outcome);
                }
            }
            PlayerAttackState::JumpKicking => {
                if elapsed >= self.config.jump_kick_attack_motion_time || ctx.movement.is_grounded() {
                    self.transition(PlayerAttackState::Idle, ctx, outcome);
                } else {
                    let struck = self.strike(ctx, self.config.jump_kick_damage, DamageKind::JumpKick);
                    outcome.struck.extend(struck);
                }
            }
            PlayerAttackState::SlideKicking => {
                if elapsed >= self.config.slide_kick_attack_motion_time
                    || ctx.movement.movement_state() != PlayerMovementState::Sliding
                {
                    self.transition(PlayerAttackState::Idle, ctx, outcome);
                } else {
                    let struck = self.strike(ctx, self.config.slide_kick_damage, DamageKind::SlideKick);
                    outcome.struck.extend(struck);
                }
            }
        }
    }

    fn transition(&mut self, to: PlayerAttackState, ctx: &mut AttackContext<'_>, outcome: &mut AttackOutcome) {
        let mut next = Some(to);
        let mut chained = 0;
        while let Some(to) = next {
            let from = self.machine.current();
            self.on_exit(from, to, ctx.now);
            self.machine.switch(to, ctx.now);
            self.on_enter(to, from, ctx, outcome);

            chained += 1;
            if chained >= MAX_CHAINED_TRANSITIONS {
                self.machine.clear_requests();
            }
            next = self.machine.take_request();
        }
    }

    fn on_enter(
        &mut self,
        state: PlayerAttackState,
        _from: PlayerAttackState,
        ctx: &mut AttackContext<'_>,
        outcome: &mut AttackOutcome,
    ) {
        match state {
            PlayerAttackState::Idle => {
                self.hits.clear();
                self.animator.reset_attack_parameters();
            }
            PlayerAttackState::Blocking => {
                self.block_input_handled = true;
                self.animator.set_flag(AnimFlag::Blocking, true);
            }
            PlayerAttackState::BasicAttacking => {
                self.variant = self.variant % self.config.basic_attack_variants.max(1) + 1;
                self.animator.set_attack_variant(self.variant);
                let struck = self.strike(ctx, self.config.basic_attack_damage, DamageKind::BasicAttack);
                outcome.struck.extend(struck);
            }
            PlayerAttackState::ChargingAttack => {
                self.charge = 0.0;
                self.animator.set_flag(AnimFlag::ChargingAttack, true);
                self.animator.set_playback_speed(0.5);
            }
            PlayerAttackState::ChargeAttacking => {
                let amount = self.config.charge_attack_damage * self.damage_multiplier();
                let struck = self.strike(ctx, amount, DamageKind::ChargeAttack);
                outcome.struck.extend(struck);

                if self.charge >= self.config.charge_attack_lunge_minimum_charge_percentage {
                    let forward = ctx.rotation.forward().horizontal().normalize_or_zero();
                    outcome.lunge = Some(forward * self.config.lunge_speed);
                }
            }
            PlayerAttackState::JumpKicking => {
                self.animator.set_flag(AnimFlag::JumpKicking, true);
            }
            PlayerAttackState::SlideKicking => {
                self.animator.set_flag(AnimFlag::SlideKicking, true);
            }
        }
    }

    fn on_exit(&mut self, state: PlayerAttackState, _to: PlayerAttackState, now: f64) {
        match state {
            PlayerAttackState::Idle | PlayerAttackState::ChargeAttacking => {}
            PlayerAttackState::Blocking => {
                self.animator.set_flag(AnimFlag::Blocking, false);
                self.ready_at.block = now + f64::from(self.config.block_cooldown);
            }
            PlayerAttackState::BasicAttacking => {
                self.ready_at.basic = now + f64::from(self.config.basic_attack_cooldown);
            }
            PlayerAttackState::ChargingAttack => {
                self.animator.set_flag(AnimFlag::ChargingAttack, false);
                self.animator.set_playback_speed(1.0);
            }
            PlayerAttackState::JumpKicking => {
                self.animator.set_flag(AnimFlag::JumpKicking, false);
                self.ready_at.jump_kick = now + f64::from(self.config.jump_kick_attack_cooldown);
            }
            PlayerAttackState::SlideKicking => {
                self.animator.set_flag(AnimFlag::SlideKicking, false);
                self.ready_at.slide_kick = now + f64::from(self.config.slide_kick_attack_cooldown);
            }
        }
    }

    fn strike(&mut self, ctx: &AttackContext<'_>, amount: f32, kind: DamageKind) -> Vec<u64> {
        let damage = DamageInfo::new(amount, kind).with_source(self.entity);
        vigil_combat::strike(
            &self.hitbox,
            ctx.world,
            ctx.position,
            ctx.rotation,
            &damage,
            &mut self.hits,
            ctx.damage,
        )
    }
}
