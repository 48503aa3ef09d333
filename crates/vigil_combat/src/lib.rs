//! Vigil Combat - Status, Damage and Melee Hits
//!
//! # Features
//!
//! - Health counter with a FreeMoving / Staggered / KnockedBack / Dead status
//! - Damage info and a fire-and-forget damage sink
//! - One-shot melee box strikes with per-swing hit registration
//!
//! # Example
//!
//! ```ignore
//! use vigil_combat::prelude::*;
//!
//! let mut status = Status::new(enemy_id, 10.0);
//! let events = status.take_damage(&DamageInfo::new(15.0, DamageKind::Melee));
//! assert!(status.is_dead());
//! ```

pub mod damage;
pub mod hits;
pub mod melee;
pub mod status;

pub mod prelude {
    pub use crate::damage::{DamageInfo, DamageKind, DamageSink, RecordingDamageSink};
    pub use crate::hits::HitRegistry;
    pub use crate::melee::{strike, MeleeHitbox};
    pub use crate::status::{HealthEvent, HealthState, Status};
}

pub use prelude::*;
