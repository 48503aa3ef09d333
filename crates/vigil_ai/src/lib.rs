//! Vigil AI - Guards, Cameras and Navigation
//!
//! This crate provides the decision side of non-player actors.
//!
//! # Features
//!
//! - Timestamped finite state machines with deferred nested transitions
//! - Grid navigation (A*) and corner-following path steering
//! - Cone perception with optional line-of-sight occlusion
//! - Patrol guard and security camera behaviours
//! - A shared alarm service
//!
//! # Example
//!
//! ```ignore
//! use vigil_ai::prelude::*;
//!
//! let services = WorldServices::shared();
//! let mut camera = SecurityCamera::new("cam-1", eye, 0.0, -0.3, SecurityCameraConfig::default(), services.clone(), now)?;
//! camera.tick(Some(player_position), &ConeSensor::default(), now, dt);
//! if services.is_alarm_raised() {
//!     guard.tick(&guard_observer, Some(player_position), &sensor, now, dt);
//! }
//! ```

pub mod error;
pub mod navigation;
pub mod patrol;
pub mod perception;
pub mod security_camera;
pub mod services;
pub mod state_machine;
pub mod steering;

pub mod prelude {
    pub use crate::error::{AiError, Result};
    pub use crate::navigation::{NavGrid, PathQuery};
    pub use crate::patrol::{GuardOutput, GuardState, PatrolConfig, PatrolGuard};
    pub use crate::perception::{ConeSensor, Observer, OccludedSensor, Perception};
    pub use crate::security_camera::{CameraIndicator, CameraState, SecurityCamera, SecurityCameraConfig};
    pub use crate::services::WorldServices;
    pub use crate::state_machine::{StateMachine, MAX_CHAINED_TRANSITIONS};
    pub use crate::steering::PathFollower;
}

pub use prelude::*;
