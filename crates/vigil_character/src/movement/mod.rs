//! Movement state machines
//!
//! The player controller is the full variant with sliding and ledge
//! traversal. The enemy controller in [`crate::enemy`] reuses the
//! locomotion and crouch pieces but stays in its default state.

pub mod crouch;
pub mod ledge;
pub mod locomotion;
pub mod player;

use serde::{Deserialize, Serialize};

pub use crouch::CrouchLatch;
pub use ledge::{Anchor, ClimbKind, LedgeProbe, LedgeScan};
pub use locomotion::JumpLatch;
pub use player::PlayerMovementController;

/// Player movement states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerMovementState {
    Default,
    Sliding,
    Hanging,
    ClimbingUp,
}

/// Lockout after a hard landing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FallRecoveryStatus {
    #[default]
    None,
    Recovering,
    CrouchRecovering,
}

/// Read-only view of a movement controller
///
/// The attack machine holds one of these for the duration of its update
/// and never writes back.
pub trait MovementView {
    fn movement_state(&self) -> PlayerMovementState;

    /// Seconds since the current movement state was entered
    fn time_in_movement_state(&self, now: f64) -> f32;

    /// Standing on stable ground this tick
    fn is_grounded(&self) -> bool;

    /// Zero while grounded, else seconds since stable ground was left
    fn time_since_grounded(&self, now: f64) -> f32;

    fn is_crouching(&self) -> bool;

    fn is_recovering(&self) -> bool;

    fn local_movement_is_forward_facing(&self) -> bool;
}
