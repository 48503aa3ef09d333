//! Error types for character construction and configuration

use thiserror::Error;
use vigil_ai::AiError;
use vigil_physics::PhysicsError;

/// Character setup errors
///
/// Runtime conditions such as an obstructed uncrouch or an unreachable
/// destination are never errors; they show up as state.
#[derive(Debug, Error)]
pub enum CharacterError {
    /// A collaborator was not provided before the first tick
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for the expected schema
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config values that cannot drive the simulation
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("AI error: {0}")]
    Ai(#[from] AiError),
}

/// Result type for character operations
pub type Result<T> = std::result::Result<T, CharacterError>;
