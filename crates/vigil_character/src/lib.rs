//! Vigil Character - Player and Enemy Controllers
//!
//! # Features
//!
//! - Player movement state machine: Default, Sliding, Hanging, ClimbingUp
//! - Ledge hang, climb, vault and step-up on anchored interpolation
//! - Player attack state machine with charge, block and kicks
//! - Enemy movement controller and agent with patrol brain
//! - Orbit camera producing the rotation movement is read against
//! - TOML configuration with per-field defaults
//!
//! # Tick order
//!
//! ```text
//! InputFrame ─► Player::tick
//!                 ├─ PlayerMovementController::set_inputs
//!                 ├─ AttackController::set_inputs
//!                 ├─ KinematicMotor::tick(movement)
//!                 └─ AttackController::post_update ─► lunge ─► add_velocity
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vigil_character::prelude::*;
//!
//! let config = load_config("game.toml")?;
//! let mut player = Player::builder(1)
//!     .config(config)
//!     .animator(Arc::new(NullAnimator))
//!     .damage_sink(sink)
//!     .build()?;
//!
//! player.tick(&input, &world, now, 1.0 / 60.0);
//! ```

pub mod animation;
pub mod attack;
pub mod camera;
pub mod config;
pub mod enemy;
pub mod error;
pub mod input;
pub mod movement;
pub mod player;

pub mod prelude {
    pub use crate::animation::{AnimFlag, AnimationSink, NullAnimator, RecordingAnimator, Stance};
    pub use crate::attack::{AttackController, AttackOutcome, Interaction, NoInteraction, PlayerAttackState};
    pub use crate::camera::OrbitCamera;
    pub use crate::config::{
        load_config, load_config_from_str, AttackConfig, EnemyConfig, FallConfig, GameConfig, JumpConfig,
        LedgeConfig, MovementConfig, OrbitCameraConfig, SlideConfig,
    };
    pub use crate::enemy::{EnemyAgent, EnemyMovementController};
    pub use crate::error::{CharacterError, Result};
    pub use crate::input::{EnemyInputs, InputFrame};
    pub use crate::movement::{
        ClimbKind, FallRecoveryStatus, MovementView, PlayerMovementController, PlayerMovementState,
    };
    pub use crate::player::{Player, PlayerBuilder};
}

pub use prelude::*;
