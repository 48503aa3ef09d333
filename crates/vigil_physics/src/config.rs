//! Motor configuration

use crate::error::{PhysicsError, Result};
use crate::layers::LayerMask;
use serde::{Deserialize, Serialize};

/// Kinematic motor tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorConfig {
    /// Steepest ground, in degrees from up, that still counts as stable
    #[serde(default = "default_max_stable_slope")]
    pub max_stable_slope_angle: f32,

    /// How far below the feet the ground probe reaches
    #[serde(default = "default_ground_probe_distance")]
    pub ground_probe_distance: f32,

    /// Seconds of skipped ground probing after `force_unground`
    #[serde(default = "default_unground_time")]
    pub unground_time: f32,

    /// Speed towards the open side of a ledge at or above which the motor
    /// stops snapping to it
    #[serde(default)]
    pub max_velocity_for_ledge_snap: f32,

    /// Layers the capsule is blocked by
    #[serde(default)]
    pub collidable_layers: LayerMask,
}

fn default_max_stable_slope() -> f32 { 60.0 }
fn default_ground_probe_distance() -> f32 { 0.1 }
fn default_unground_time() -> f32 { 0.1 }

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            max_stable_slope_angle: default_max_stable_slope(),
            ground_probe_distance: default_ground_probe_distance(),
            unground_time: default_unground_time(),
            max_velocity_for_ledge_snap: 0.0,
            collidable_layers: LayerMask::default(),
        }
    }
}

impl MotorConfig {
    /// Set the collidable layers
    pub fn with_collidable_layers(mut self, layers: LayerMask) -> Self {
        self.collidable_layers = layers;
        self
    }

    /// Set the stable slope limit in degrees
    pub fn with_max_stable_slope(mut self, degrees: f32) -> Self {
        self.max_stable_slope_angle = degrees;
        self
    }

    /// Reject values the motor cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..90.0).contains(&self.max_stable_slope_angle) {
            return Err(PhysicsError::InvalidConfig(format!(
                "max_stable_slope_angle must be in [0, 90), got {}",
                self.max_stable_slope_angle
            )));
        }
        if self.ground_probe_distance < 0.0 || self.unground_time < 0.0 || self.max_velocity_for_ledge_snap < 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "ground probe distance, unground time and ledge snap velocity must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Minimum `normal . up` for a contact to count as stable ground
    pub fn stable_normal_threshold(&self) -> f32 {
        vigil_math::radians(self.max_stable_slope_angle).cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MotorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_vertical_slope() {
        let config = MotorConfig::default().with_max_stable_slope(90.0);
        assert!(config.validate().is_err());
    }
}
