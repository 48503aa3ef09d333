//! Error types for the physics layer

use thiserror::Error;

/// Physics errors
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Capsule dimensions that cannot describe a capsule
    #[error("Invalid capsule dimensions: {0}")]
    InvalidCapsule(String),

    /// Invalid motor configuration
    #[error("Invalid motor configuration: {0}")]
    InvalidConfig(String),

    /// Collider handle not registered in the world
    #[error("Collider not found: {0:?}")]
    ColliderNotFound(crate::query::ColliderHandle),
}

/// Result type for physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
