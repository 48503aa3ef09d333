//! Error types for AI construction

use thiserror::Error;

/// AI configuration errors
#[derive(Debug, Error)]
pub enum AiError {
    /// A patrol guard needs at least one waypoint
    #[error("Patrol route has no waypoints")]
    EmptyPatrolRoute,

    /// Scan time or arc that cannot drive a camera sweep
    #[error("Invalid scan configuration: {0}")]
    InvalidScanConfig(String),

    /// Navigation grid with no cells
    #[error("Invalid navigation grid: {0}")]
    InvalidNavGrid(String),
}

/// Result type for AI operations
pub type Result<T> = std::result::Result<T, AiError>;
