//! Buffered input frames

use serde::{Deserialize, Serialize};
use vigil_math::{Quat, Vec3};

/// Snapshot of the player's inputs, taken once per tick
///
/// Edge fields (`jump`, `crouch`, ...) are true only on the tick the button
/// went down. `*_hold` fields stay true while the button is held.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Strafe axis in [-1, 1]
    pub move_axis_right: f32,
    /// Forward axis in [-1, 1]
    pub move_axis_forward: f32,
    pub camera_rotation: Quat,
    pub walk: bool,
    pub jump: bool,
    pub jump_hold: bool,
    pub crouch: bool,
    pub crouch_hold: bool,
    pub primary_fire: bool,
    pub primary_fire_hold: bool,
    pub secondary_fire: bool,
    pub secondary_fire_hold: bool,
    pub interact: bool,
    pub interact_hold: bool,
}

impl Default for InputFrame {
    fn default() -> Self {
        Self {
            move_axis_right: 0.0,
            move_axis_forward: 0.0,
            camera_rotation: Quat::IDENTITY,
            walk: false,
            jump: false,
            jump_hold: false,
            crouch: false,
            crouch_hold: false,
            primary_fire: false,
            primary_fire_hold: false,
            secondary_fire: false,
            secondary_fire_hold: false,
            interact: false,
            interact_hold: false,
        }
    }
}

impl InputFrame {
    /// Local move vector (x right, z forward), clamped to unit length
    pub fn move_vector(&self) -> Vec3 {
        let raw = Vec3::new(self.move_axis_right, 0.0, self.move_axis_forward);
        if raw.length_squared() > 1.0 {
            raw.normalize_or_zero()
        } else {
            raw
        }
    }

    pub fn is_forward_facing(&self) -> bool {
        self.move_axis_forward > 0.0
    }

    /// Held-button state for the next tick, edges cleared
    pub fn held(&self) -> Self {
        Self {
            jump: false,
            crouch: false,
            primary_fire: false,
            secondary_fire: false,
            interact: false,
            ..*self
        }
    }
}

/// Synthetic inputs produced by AI for an enemy body
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnemyInputs {
    /// World-space desired move direction
    pub move_vector: Vec3,
    /// Point the enemy should face, if any
    pub look_target: Option<Vec3>,
    pub jump: bool,
    pub crouch: bool,
}
