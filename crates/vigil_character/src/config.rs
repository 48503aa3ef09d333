//! Game tuning
//!
//! Every section deserializes with per-field defaults, so a TOML file only
//! needs the values it changes:
//!
//! ```toml
//! [movement]
//! max_stable_run_speed = 6.0
//!
//! [attack]
//! attack_fully_charged_motion_time = 2.0
//! ```

use crate::error::{CharacterError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vigil_ai::{PatrolConfig, SecurityCameraConfig};
use vigil_math::Vec3;

/// Ground and air locomotion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub max_stable_run_speed: f32,
    pub max_stable_crouch_run_speed: f32,
    pub max_stable_walk_speed: f32,
    pub max_stable_crouch_walk_speed: f32,
    pub stable_movement_sharpness: f32,
    pub orientation_sharpness: f32,
    /// Scale of the movement animation value while walking
    pub walk_speed_percentage: f32,
    pub max_air_move_speed: f32,
    pub air_acceleration_speed: f32,
    pub drag: f32,
    pub gravity: Vec3,
    /// Re-level the character up axis against gravity
    pub orient_towards_gravity: bool,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_stable_run_speed: 5.0,
            max_stable_crouch_run_speed: 3.0,
            max_stable_walk_speed: 3.0,
            max_stable_crouch_walk_speed: 2.0,
            stable_movement_sharpness: 12.0,
            orientation_sharpness: 12.0,
            walk_speed_percentage: 0.5,
            max_air_move_speed: 6.0,
            air_acceleration_speed: 3.0,
            drag: 0.1,
            gravity: Vec3::new(0.0, -25.0, 0.0),
            orient_towards_gravity: false,
        }
    }
}

impl MovementConfig {
    /// Target ground speed for the walk/crouch combination
    pub fn stable_speed(&self, walking: bool, crouching: bool) -> f32 {
        match (walking, crouching) {
            (true, true) => self.max_stable_crouch_walk_speed,
            (false, true) => self.max_stable_crouch_run_speed,
            (true, false) => self.max_stable_walk_speed,
            (false, false) => self.max_stable_run_speed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    pub jump_height: f32,
    /// Allow jumping off unstable ground
    pub allow_jumping_when_sliding: bool,
    /// How long a jump press waits for ground
    pub pre_grounding_grace_time: f32,
    /// How long after leaving ground a jump is still allowed
    pub post_grounding_grace_time: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            jump_height: 1.3,
            allow_jumping_when_sliding: true,
            pre_grounding_grace_time: 0.0,
            post_grounding_grace_time: 0.0,
        }
    }
}

impl JumpConfig {
    /// Launch speed reaching `jump_height` under `gravity`
    pub fn jump_speed(&self, gravity: f32) -> f32 {
        (2.0 * self.jump_height * gravity).sqrt()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallConfig {
    /// Fall height that triggers a short recovery
    pub recovery_threshold: f32,
    /// Fall height that triggers a crouched recovery
    pub crouch_recovery_threshold: f32,
    pub recovery_time: f32,
    pub crouch_recovery_time: f32,
}

impl Default for FallConfig {
    fn default() -> Self {
        let jump_height = JumpConfig::default().jump_height;
        Self {
            recovery_threshold: 2.3 * jump_height,
            crouch_recovery_threshold: 2.6 * jump_height,
            recovery_time: 0.15,
            crouch_recovery_time: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideConfig {
    /// Minimum speed for a crouch press to start a slide
    pub velocity_threshold: f32,
    /// Degrees per tick the slide may turn, also the steering sharpness
    pub rotation_speed: f32,
    pub slide_speed: f32,
    pub max_slide_time: f32,
    pub stopped_time: f32,
    /// Fraction of slide velocity lost per tick
    pub decay: f32,
}

impl Default for SlideConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 2.0,
            rotation_speed: 1.25,
            slide_speed: 10.0,
            max_slide_time: 0.6,
            stopped_time: 0.3,
            decay: 0.01,
        }
    }
}

/// Ledge grab, climb, vault and step-up
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgeConfig {
    /// Length of the forward probe rays
    pub check_distance: f32,
    pub foot_height: f32,
    pub knee_height: f32,
    pub torso_height: f32,
    pub head_height: f32,
    /// Fastest fall that can still grab a ledge
    pub max_grab_fall_speed: f32,
    /// Distance from the ledge top down to the feet while hanging
    pub hang_offset: f32,
    pub hang_anchor_time: f32,
    pub climb_up_time: f32,
    pub vault_time: f32,
    pub step_up_time: f32,
    /// Delay before a dropped ledge can be grabbed again
    pub regrab_cooldown: f32,
}

impl Default for LedgeConfig {
    fn default() -> Self {
        Self {
            check_distance: 0.6,
            foot_height: 0.1,
            knee_height: 0.5,
            torso_height: 1.2,
            head_height: 1.9,
            max_grab_fall_speed: 12.0,
            hang_offset: 1.7,
            hang_anchor_time: 0.2,
            climb_up_time: 0.9,
            vault_time: 0.5,
            step_up_time: 0.25,
            regrab_cooldown: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    pub jump_kick_allowance_time: f32,
    pub slide_kick_allowance_time: f32,
    pub max_charge_attack_damage_multiplier: f32,
    pub charge_attack_minimum_charge_percentage: f32,
    pub charge_attack_lunge_minimum_charge_percentage: f32,

    pub block_motion_time: f32,
    pub basic_attack_motion_time: f32,
    pub attack_fully_charged_motion_time: f32,
    pub charge_attack_motion_time: f32,
    pub jump_kick_attack_motion_time: f32,
    pub slide_kick_attack_motion_time: f32,

    pub block_cooldown: f32,
    pub basic_attack_cooldown: f32,
    pub jump_kick_attack_cooldown: f32,
    pub slide_kick_attack_cooldown: f32,

    pub basic_attack_damage: f32,
    pub charge_attack_damage: f32,
    pub jump_kick_damage: f32,
    pub slide_kick_damage: f32,
    /// Forward impulse of a well charged attack
    pub lunge_speed: f32,
    /// Number of basic attack animations to cycle through
    pub basic_attack_variants: u32,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            jump_kick_allowance_time: 0.2,
            slide_kick_allowance_time: 0.2,
            max_charge_attack_damage_multiplier: 2.5,
            charge_attack_minimum_charge_percentage: 0.3,
            charge_attack_lunge_minimum_charge_percentage: 0.6,

            block_motion_time: 0.5,
            basic_attack_motion_time: 0.3,
            attack_fully_charged_motion_time: 2.5,
            charge_attack_motion_time: 0.6,
            jump_kick_attack_motion_time: 15.0,
            slide_kick_attack_motion_time: 0.6,

            block_cooldown: 0.3,
            basic_attack_cooldown: 0.1,
            jump_kick_attack_cooldown: 0.5,
            slide_kick_attack_cooldown: 0.5,

            basic_attack_damage: 10.0,
            charge_attack_damage: 10.0,
            jump_kick_damage: 15.0,
            slide_kick_damage: 12.0,
            lunge_speed: 6.0,
            basic_attack_variants: 3,
        }
    }
}

/// Third-person orbit camera
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitCameraConfig {
    pub invert_x: bool,
    pub invert_y: bool,
    /// Degrees
    pub default_vertical_angle: f32,
    pub min_vertical_angle: f32,
    pub max_vertical_angle: f32,
    pub rotation_speed: f32,
    pub rotation_sharpness: f32,
}

impl Default for OrbitCameraConfig {
    fn default() -> Self {
        Self {
            invert_x: false,
            invert_y: false,
            default_vertical_angle: 20.0,
            min_vertical_angle: -80.0,
            max_vertical_angle: 80.0,
            rotation_speed: 10.0,
            rotation_sharpness: 30.0,
        }
    }
}

/// Enemy body tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub movement: MovementConfig,
    pub allow_jumping_when_sliding: bool,
    pub jump_speed: f32,
    pub pre_grounding_grace_time: f32,
    pub post_grounding_grace_time: f32,
    /// Movement lock after landing from a jump
    pub jump_recovery_time: f32,
    pub max_health: f32,
    pub melee_damage: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            movement: MovementConfig {
                orientation_sharpness: 10.0,
                max_air_move_speed: 5.0,
                air_acceleration_speed: 0.0,
                gravity: Vec3::new(0.0, -20.0, 0.0),
                ..MovementConfig::default()
            },
            allow_jumping_when_sliding: false,
            jump_speed: 6.0,
            pre_grounding_grace_time: 0.0,
            post_grounding_grace_time: 0.0,
            jump_recovery_time: 0.2,
            max_health: 30.0,
            melee_damage: 10.0,
        }
    }
}

/// Everything tunable in one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub movement: MovementConfig,
    pub jump: JumpConfig,
    pub fall: FallConfig,
    pub slide: SlideConfig,
    pub ledge: LedgeConfig,
    pub attack: AttackConfig,
    pub camera: OrbitCameraConfig,
    pub enemy: EnemyConfig,
    pub patrol: PatrolConfig,
    pub security_camera: SecurityCameraConfig,
}

impl GameConfig {
    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f32) -> Result<()> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(CharacterError::Invalid(format!("{name} must be positive, got {value}")))
            }
        }

        positive("attack.attack_fully_charged_motion_time", self.attack.attack_fully_charged_motion_time)?;
        positive("ledge.hang_anchor_time", self.ledge.hang_anchor_time)?;
        positive("ledge.climb_up_time", self.ledge.climb_up_time)?;
        positive("ledge.vault_time", self.ledge.vault_time)?;
        positive("ledge.step_up_time", self.ledge.step_up_time)?;
        positive("jump.jump_height", self.jump.jump_height)?;

        if self.fall.crouch_recovery_threshold < self.fall.recovery_threshold {
            return Err(CharacterError::Invalid(format!(
                "fall.crouch_recovery_threshold {} is below fall.recovery_threshold {}",
                self.fall.crouch_recovery_threshold, self.fall.recovery_threshold
            )));
        }
        if self.attack.charge_attack_lunge_minimum_charge_percentage
            < self.attack.charge_attack_minimum_charge_percentage
        {
            return Err(CharacterError::Invalid(
                "attack lunge threshold is below the charge attack threshold".to_string(),
            ));
        }
        if self.camera.min_vertical_angle > self.camera.max_vertical_angle {
            return Err(CharacterError::Invalid(format!(
                "camera vertical range [{}, {}] is inverted",
                self.camera.min_vertical_angle, self.camera.max_vertical_angle
            )));
        }
        if self.attack.basic_attack_variants == 0 {
            return Err(CharacterError::Invalid("attack.basic_attack_variants must be at least 1".to_string()));
        }

        self.security_camera.validate()?;
        Ok(())
    }
}

/// Parse and validate a TOML document
pub fn load_config_from_str(source: &str) -> Result<GameConfig> {
    let config: GameConfig = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<GameConfig> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    let config = load_config_from_str(&source)?;
    log::info!("Loaded game config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_are_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = load_config_from_str(
            r#"
            [movement]
            max_stable_run_speed = 7.5

            [security_camera]
            scan_time = 4.0
            "#,
        )
        .unwrap();

        assert_relative_eq!(config.movement.max_stable_run_speed, 7.5);
        assert_relative_eq!(config.movement.max_stable_walk_speed, 3.0);
        assert_relative_eq!(config.security_camera.scan_time, 4.0);
        assert_relative_eq!(config.security_camera.wait_time, 1.0);
        assert_relative_eq!(config.enemy.movement.gravity.y, -20.0);
    }

    #[test]
    fn test_fall_thresholds_follow_jump_height() {
        let fall = FallConfig::default();
        assert_relative_eq!(fall.recovery_threshold, 2.99, epsilon = 1e-5);
        assert_relative_eq!(fall.crouch_recovery_threshold, 3.38, epsilon = 1e-5);
    }

    #[test]
    fn test_rejects_zero_charge_time() {
        let result = load_config_from_str("[attack]\nattack_fully_charged_motion_time = 0.0\n");
        assert!(matches!(result, Err(CharacterError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_scan() {
        let result = load_config_from_str("[security_camera]\nscan_arc_degrees = 0.0\n");
        assert!(matches!(result, Err(CharacterError::Ai(_))));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let result = load_config_from_str("[movement\n");
        assert!(matches!(result, Err(CharacterError::Parse(_))));
    }

    #[test]
    fn test_speed_table() {
        let movement = MovementConfig::default();
        assert_eq!(movement.stable_speed(false, false), 5.0);
        assert_eq!(movement.stable_speed(true, false), 3.0);
        assert_eq!(movement.stable_speed(false, true), 3.0);
        assert_eq!(movement.stable_speed(true, true), 2.0);
    }
}
