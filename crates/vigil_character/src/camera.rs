//! Third-person orbit camera rotation

use crate::config::OrbitCameraConfig;
use vigil_math::{exp_smoothing, radians, Quat, Vec2, Vec3};

/// Orbit rotation driven by look input
///
/// Yaw is kept as a planar direction around the character up axis, pitch
/// as a clamped angle in degrees. The output rotation feeds
/// [`crate::input::InputFrame::camera_rotation`].
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    config: OrbitCameraConfig,
    planar_direction: Vec3,
    target_vertical_angle: f32,
    rotation: Quat,
}

impl OrbitCamera {
    pub fn new(config: OrbitCameraConfig, initial_forward: Vec3, up: Vec3) -> Self {
        let mut planar_direction = initial_forward.project_on_plane(up).normalize_or_zero();
        if planar_direction.is_near_zero() {
            planar_direction = up.any_orthogonal();
        }

        let clamped = config
            .default_vertical_angle
            .clamp(config.min_vertical_angle, config.max_vertical_angle);
        if clamped != config.default_vertical_angle {
            log::warn!(
                "Default vertical angle {} outside [{}, {}], clamped to {}",
                config.default_vertical_angle,
                config.min_vertical_angle,
                config.max_vertical_angle,
                clamped
            );
        }

        let rotation = Quat::look_rotation(planar_direction, up) * Quat::from_rotation_x(radians(clamped));
        Self {
            config,
            planar_direction,
            target_vertical_angle: clamped,
            rotation,
        }
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn planar_direction(&self) -> Vec3 {
        self.planar_direction
    }

    /// Degrees, positive looks down
    pub fn target_vertical_angle(&self) -> f32 {
        self.target_vertical_angle
    }

    /// Apply one tick of look input and return the smoothed rotation
    pub fn update(&mut self, look: Vec2, up: Vec3, dt: f32) -> Quat {
        let look_x = if self.config.invert_x { -look.x } else { look.x };
        let look_y = if self.config.invert_y { -look.y } else { look.y };

        let yaw = Quat::from_axis_angle(up, radians(look_x * self.config.rotation_speed));
        let planar = (yaw * self.planar_direction).project_on_plane(up).normalize_or_zero();
        if !planar.is_near_zero() {
            self.planar_direction = planar;
        }

        self.target_vertical_angle = (self.target_vertical_angle - look_y * self.config.rotation_speed)
            .clamp(self.config.min_vertical_angle, self.config.max_vertical_angle);

        let target = Quat::look_rotation(self.planar_direction, up)
            * Quat::from_rotation_x(radians(self.target_vertical_angle));
        self.rotation = self
            .rotation
            .slerp(target, exp_smoothing(self.config.rotation_sharpness, dt));
        self.rotation
    }
}
