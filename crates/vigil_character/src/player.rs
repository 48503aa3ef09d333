//! Player composite
//!
//! Owns the motor, the movement and attack machines and the health status,
//! and runs them in a fixed order every tick:
//!
//! ```text
//! set_inputs (movement, attack) ─► motor.tick(movement) ─► attack.post_update ─► lunge
//! ```

use crate::attack::{AttackContext, AttackController, AttackOutcome, Interaction, NoInteraction};
use crate::config::GameConfig;
use crate::error::{CharacterError, Result};
use crate::input::InputFrame;
use crate::movement::PlayerMovementController;
use crate::animation::AnimationSink;
use std::sync::Arc;
use vigil_combat::{DamageInfo, DamageSink, HealthEvent, Status};
use vigil_math::{Quat, Vec3};
use vigil_physics::{CollisionQuery, KinematicMotor, MotorConfig};

/// Default player health
pub const PLAYER_MAX_HEALTH: f32 = 100.0;

/// Builder for [`Player`]
///
/// The animation and damage sinks are required; building without either is
/// a configuration error.
pub struct PlayerBuilder {
    entity: u64,
    position: Vec3,
    rotation: Quat,
    config: GameConfig,
    motor_config: MotorConfig,
    max_health: f32,
    start_time: f64,
    animator: Option<Arc<dyn AnimationSink>>,
    damage: Option<Arc<dyn DamageSink>>,
    interaction: Option<Box<dyn Interaction>>,
}

impl PlayerBuilder {
    pub fn new(entity: u64) -> Self {
        Self {
            entity,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            config: GameConfig::default(),
            motor_config: MotorConfig::default(),
            max_health: PLAYER_MAX_HEALTH,
            start_time: 0.0,
            animator: None,
            damage: None,
            interaction: None,
        }
    }

    /// Feet position at spawn
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn motor_config(mut self, config: MotorConfig) -> Self {
        self.motor_config = config;
        self
    }

    pub fn max_health(mut self, max_health: f32) -> Self {
        self.max_health = max_health;
        self
    }

    /// Simulation time of the spawn
    pub fn start_time(mut self, now: f64) -> Self {
        self.start_time = now;
        self
    }

    pub fn animator(mut self, animator: Arc<dyn AnimationSink>) -> Self {
        self.animator = Some(animator);
        self
    }

    pub fn damage_sink(mut self, sink: Arc<dyn DamageSink>) -> Self {
        self.damage = Some(sink);
        self
    }

    pub fn interaction(mut self, interaction: Box<dyn Interaction>) -> Self {
        self.interaction = Some(interaction);
        self
    }

    pub fn build(self) -> Result<Player> {
        let animator = self.animator.ok_or(CharacterError::MissingCollaborator("animation sink"))?;
        let damage = self.damage.ok_or(CharacterError::MissingCollaborator("damage sink"))?;
        self.config.validate()?;

        let mut motor = KinematicMotor::new(self.position, self.motor_config)?;
        motor.set_rotation(self.rotation);

        let movement = PlayerMovementController::new(&self.config, animator.clone(), self.start_time);
        let attack = AttackController::new(self.entity, self.config.attack.clone(), animator, self.start_time);

        log::debug!("Spawned player {} at {:?}", self.entity, self.position);

        Ok(Player {
            entity: self.entity,
            motor,
            movement,
            attack,
            status: Status::new(self.entity, self.max_health),
            damage,
            interaction: self.interaction.unwrap_or_else(|| Box::new(NoInteraction)),
        })
    }
}

/// The player character
pub struct Player {
    entity: u64,
    motor: KinematicMotor,
    movement: PlayerMovementController,
    attack: AttackController,
    status: Status,
    damage: Arc<dyn DamageSink>,
    interaction: Box<dyn Interaction>,
}

impl Player {
    pub fn builder(entity: u64) -> PlayerBuilder {
        PlayerBuilder::new(entity)
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

    pub fn motor_mut(&mut self) -> &mut KinematicMotor {
        &mut self.motor
    }

    pub fn movement(&self) -> &PlayerMovementController {
        &self.movement
    }

    pub fn movement_mut(&mut self) -> &mut PlayerMovementController {
        &mut self.movement
    }

    pub fn attack(&self) -> &AttackController {
        &self.attack
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Flip the crouch latch outside the input path
    pub fn toggle_crouch(&mut self) -> bool {
        self.movement.toggle_crouch(&mut self.motor)
    }

    /// Run one fixed tick. Dead players do not move or attack.
    pub fn tick(&mut self, input: &InputFrame, world: &dyn CollisionQuery, now: f64, dt: f32) -> AttackOutcome {
        if self.status.is_dead() {
            return AttackOutcome::default();
        }

        self.movement.set_must_walk(self.attack.is_charging());
        self.movement.set_inputs(input, &mut self.motor, now);
        self.attack.set_inputs(input);

        self.motor.tick(&mut self.movement, world, now, dt);

        let outcome = {
            let mut ctx = AttackContext {
                movement: &self.movement,
                world,
                position: self.motor.position(),
                rotation: self.motor.rotation(),
                damage: &*self.damage,
                interaction: &mut *self.interaction,
                now,
            };
            self.attack.post_update(&mut ctx)
        };

        if let Some(lunge) = outcome.lunge {
            self.movement.add_velocity(lunge);
        }
        outcome
    }

    /// Apply incoming damage
    pub fn receive_attack(&mut self, damage: &DamageInfo) -> Vec<HealthEvent> {
        self.status.take_damage(damage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::RecordingAnimator;
    use vigil_combat::RecordingDamageSink;

    #[test]
    fn test_build_requires_collaborators() {
        let result = Player::builder(1).damage_sink(Arc::new(RecordingDamageSink::new())).build();
        assert!(matches!(result, Err(CharacterError::MissingCollaborator("animation sink"))));

        let result = Player::builder(1).animator(Arc::new(RecordingAnimator::new())).build();
        assert!(matches!(result, Err(CharacterError::MissingCollaborator("damage sink"))));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = GameConfig::default();
        config.attack.attack_fully_charged_motion_time = 0.0;
        let result = Player::builder(1)
            .animator(Arc::new(RecordingAnimator::new()))
            .damage_sink(Arc::new(RecordingDamageSink::new()))
            .config(config)
            .build();
        assert!(matches!(result, Err(CharacterError::Invalid(_))));
    }
}
