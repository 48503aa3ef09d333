//! Vigil Physics - Kinematic Character Motion
//!
//! This crate provides the motion side of every movable actor: a capsule
//! motor that owns position and rotation, and the callback contract that
//! per-actor logic implements to steer it.
//!
//! # Features
//!
//! - Fixed-order controller callbacks (rotation, velocity, post-update)
//! - Capsule ground casts with slope and ledge stability reports
//! - Capsule sweep-and-slide with blocking contact reports
//! - Collision layers, query filters and ignored-collider sets
//! - A rapier-backed level world of boxes, ramps and hurtboxes
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        KinematicMotor        │
//! │  ground ─ rotate ─ move ─ slide
//! └──────────────┬───────────────┘
//!        callbacks│         queries
//!         ▼                    ▼
//! ┌────────────────────┐ ┌────────────────┐
//! │ CharacterController│ │ CollisionQuery │
//! └────────────────────┘ └────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vigil_physics::prelude::*;
//!
//! let mut world = StaticWorld::new();
//! world.add_ground(0.0, 50.0);
//!
//! let mut motor = KinematicMotor::new(Vec3::new(0.0, 2.0, 0.0), MotorConfig::default())?;
//! motor.tick(&mut my_controller, &world, now, 1.0 / 60.0);
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod layers;
pub mod motor;
pub mod query;
pub mod shape;
pub mod world;

pub mod prelude {
    //! Common imports for character motion
    pub use crate::config::MotorConfig;
    pub use crate::controller::CharacterController;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::layers::{CollisionLayer, LayerMask};
    pub use crate::motor::{GroundingStatus, HitStabilityReport, KinematicMotor, MotorContext, MotorHit};
    pub use crate::query::{
        ColliderFilter, ColliderHandle, CollisionQuery, QueryFilter, RaycastHit, SweepHit, CONTACT_OFFSET,
    };
    pub use crate::shape::CapsuleShape;
    pub use crate::world::{StaticWorld, WorldCollider};
}

pub use prelude::*;
