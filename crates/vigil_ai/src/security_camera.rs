//! Sweeping security camera
//!
//! The camera yaws back and forth across a fixed arc centred on its mounting
//! heading. A visible target makes it track; sustained tracking raises the
//! world alarm. While the alarm is up the camera follows the target within
//! its arc, and when the alarm clears it resumes scanning from whichever end
//! of the arc is nearer.

use crate::error::{AiError, Result};
use crate::perception::{Observer, Perception};
use crate::services::WorldServices;
use crate::state_machine::{StateMachine, MAX_CHAINED_TRANSITIONS};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vigil_math::{delta_angle, move_towards, radians, Quat, Vec3};

/// Camera behaviour states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraState {
    ScanningLeft,
    ScanningRight,
    Tracking,
    Alert,
}

/// Light colour shown by the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraIndicator {
    Idle,
    Suspicious,
    Alarmed,
}

/// Camera tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityCameraConfig {
    /// Seconds for one full sweep between the extremes
    #[serde(default = "default_scan_time")]
    pub scan_time: f32,
    /// Pause at each extreme
    #[serde(default = "default_wait_time")]
    pub wait_time: f32,
    /// Continuous sight needed to raise the alarm
    #[serde(default = "default_track_time")]
    pub track_time: f32,
    /// How long a lost target is waited for
    #[serde(default = "default_search_time")]
    pub search_time: f32,
    /// Full sweep arc in degrees
    #[serde(default = "default_scan_arc")]
    pub scan_arc_degrees: f32,
}

fn default_scan_time() -> f32 { 2.0 }
fn default_wait_time() -> f32 { 1.0 }
fn default_track_time() -> f32 { 1.5 }
fn default_search_time() -> f32 { 2.0 }
fn default_scan_arc() -> f32 { 90.0 }

impl Default for SecurityCameraConfig {
    fn default() -> Self {
        Self {
            scan_time: default_scan_time(),
            wait_time: default_wait_time(),
            track_time: default_track_time(),
            search_time: default_search_time(),
            scan_arc_degrees: default_scan_arc(),
        }
    }
}

impl SecurityCameraConfig {
    /// Reject sweeps that would never move
    pub fn validate(&self) -> Result<()> {
        if self.scan_time <= 0.0 {
            return Err(AiError::InvalidScanConfig(format!(
                "scan time must be positive, got {}",
                self.scan_time
            )));
        }
        if self.scan_arc_degrees <= 0.0 || self.scan_arc_degrees >= 360.0 {
            return Err(AiError::InvalidScanConfig(format!(
                "scan arc must be within (0, 360) degrees, got {}",
                self.scan_arc_degrees
            )));
        }
        Ok(())
    }
}

/// Yawing camera with alarm escalation
#[derive(Debug)]
pub struct SecurityCamera {
    name: String,
    machine: StateMachine<CameraState>,
    position: Vec3,
    pitch: f32,
    base_yaw: f32,
    yaw: f32,
    target_yaw: f32,
    left_extreme: f32,
    right_extreme: f32,
    /// Radians per second
    rotation_speed: f32,
    wait_timer: f32,
    detection_timer: f32,
    search_timer: f32,
    lost_sight: bool,
    resume_scan: CameraState,
    services: Arc<WorldServices>,
    config: SecurityCameraConfig,
}

impl SecurityCamera {
    /// Mount a camera at `position` facing `base_yaw` radians, tilted down by
    /// `pitch` radians. Scanning starts toward the right extreme.
    pub fn new(
        name: impl Into<String>,
        position: Vec3,
        base_yaw: f32,
        pitch: f32,
        config: SecurityCameraConfig,
        services: Arc<WorldServices>,
        now: f64,
    ) -> Result<Self> {
        config.validate()?;
        let half_arc = radians(config.scan_arc_degrees) * 0.5;
        let mut camera = Self {
            name: name.into(),
            machine: StateMachine::new("SecurityCamera", CameraState::ScanningRight, now),
            position,
            pitch,
            base_yaw,
            yaw: base_yaw,
            target_yaw: base_yaw,
            left_extreme: base_yaw - half_arc,
            right_extreme: base_yaw + half_arc,
            rotation_speed: 2.0 * half_arc / config.scan_time,
            wait_timer: 0.0,
            detection_timer: 0.0,
            search_timer: 0.0,
            lost_sight: false,
            resume_scan: CameraState::ScanningRight,
            services,
            config,
        };
        camera.on_enter(CameraState::ScanningRight, CameraState::ScanningRight);
        Ok(camera)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CameraState {
        self.machine.current()
    }

    pub fn previous_state(&self) -> CameraState {
        self.machine.previous()
    }

    pub fn time_since_entering_state(&self, now: f64) -> f32 {
        self.machine.time_in_state(now)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current heading in radians
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn left_extreme(&self) -> f32 {
        self.left_extreme
    }

    pub fn right_extreme(&self) -> f32 {
        self.right_extreme
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    /// Sensor pose for perception queries
    pub fn observer(&self) -> Observer {
        Observer::new(self.position, self.rotation())
    }

    /// Fraction of the tracking time accumulated so far
    pub fn detection_progress(&self) -> f32 {
        (self.detection_timer / self.config.track_time.max(f32::EPSILON)).clamp(0.0, 1.0)
    }

    pub fn indicator(&self) -> CameraIndicator {
        match self.state() {
            CameraState::ScanningLeft | CameraState::ScanningRight => CameraIndicator::Idle,
            CameraState::Tracking => CameraIndicator::Suspicious,
            CameraState::Alert => CameraIndicator::Alarmed,
        }
    }

    /// Rotate, then evaluate the current state
    pub fn tick(&mut self, target: Option<Vec3>, perception: &dyn Perception, now: f64, dt: f32) {
        self.rotate(dt);

        if self.services.is_alarm_raised() && self.state() != CameraState::Alert {
            self.transition_to(CameraState::Alert, now);
        }

        let observer = self.observer();
        let visible = target.is_some_and(|t| perception.is_visible(&observer, t));
        let in_range = target.filter(|t| perception.is_in_range(&observer, *t));

        match self.state() {
            state @ (CameraState::ScanningLeft | CameraState::ScanningRight) => {
                if visible {
                    self.transition_to(CameraState::Tracking, now);
                    return;
                }
                let (extreme, opposite) = if state == CameraState::ScanningLeft {
                    (self.left_extreme, CameraState::ScanningRight)
                } else {
                    (self.right_extreme, CameraState::ScanningLeft)
                };
                if self.yaw == extreme {
                    self.wait_timer += dt;
                    if self.wait_timer >= self.config.wait_time {
                        self.transition_to(opposite, now);
                    }
                }
            }
            CameraState::Tracking => {
                if self.search_timer < self.config.search_time {
                    match in_range {
                        Some(t) if !self.lost_sight => self.target_yaw = self.clamped_look_yaw(t),
                        _ => self.lost_sight = true,
                    }
                }

                if visible {
                    self.search_timer = 0.0;
                    self.detection_timer += dt;
                    if self.detection_timer >= self.config.track_time {
                        self.services.raise_alarm(&self.name);
                        self.transition_to(CameraState::Alert, now);
                    }
                } else {
                    self.search_timer += dt;
                    if self.search_timer >= self.config.search_time {
                        self.transition_to(self.resume_scan, now);
                    }
                }
            }
            CameraState::Alert => {
                if !self.services.is_alarm_raised() {
                    let closest = self.closest_extreme();
                    self.transition_to(closest, now);
                } else if let Some(t) = in_range {
                    self.target_yaw = self.clamped_look_yaw(t);
                } else {
                    self.target_yaw = self.yaw;
                }
            }
        }
    }

    fn rotate(&mut self, dt: f32) {
        let step = self.rotation_speed * dt;
        let delta = delta_angle(self.yaw, self.target_yaw);
        self.yaw = if delta.abs() <= step {
            self.target_yaw
        } else {
            move_towards(self.yaw, self.yaw + delta, step)
        };
    }

    /// Heading toward `target`, clamped into the sweep arc
    fn clamped_look_yaw(&self, target: Vec3) -> f32 {
        let to_target = target - self.position;
        if to_target.horizontal().is_near_zero() {
            return self.yaw;
        }
        let desired = to_target.x.atan2(to_target.z);
        let half_arc = radians(self.config.scan_arc_degrees) * 0.5;
        self.base_yaw + delta_angle(self.base_yaw, desired).clamp(-half_arc, half_arc)
    }

    fn closest_extreme(&self) -> CameraState {
        let to_left = delta_angle(self.yaw, self.left_extreme).abs();
        let to_right = delta_angle(self.yaw, self.right_extreme).abs();
        if to_left <= to_right {
            CameraState::ScanningLeft
        } else {
            CameraState::ScanningRight
        }
    }

    fn transition_to(&mut self, to: CameraState, now: f64) {
        let mut next = Some(to);
        let mut chained = 0;
        while let Some(to) = next {
            let from = self.machine.current();
            self.machine.switch(to, now);
            self.on_enter(to, from);

            chained += 1;
            if chained >= MAX_CHAINED_TRANSITIONS {
                self.machine.clear_requests();
            }
            next = self.machine.take_request();
        }
    }

    fn on_enter(&mut self, state: CameraState, _from: CameraState) {
        match state {
            CameraState::ScanningLeft => {
                self.target_yaw = self.left_extreme;
                self.wait_timer = 0.0;
                self.resume_scan = state;
            }
            CameraState::ScanningRight => {
                self.target_yaw = self.right_extreme;
                self.wait_timer = 0.0;
                self.resume_scan = state;
            }
            CameraState::Tracking => {
                self.detection_timer = 0.0;
                self.search_timer = 0.0;
                self.lost_sight = false;
            }
            CameraState::Alert => {
                self.target_yaw = self.yaw;
            }
        }
    }
}
