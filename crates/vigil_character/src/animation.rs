//! Presentation notifications
//!
//! Controllers push state to an [`AnimationSink`] and never read it back.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Boolean animator parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimFlag {
    Crouching,
    Walking,
    Sliding,
    Jumping,
    Hanging,
    ClimbingUp,
    Vaulting,
    SteppingUp,
    Blocking,
    ChargingAttack,
    JumpKicking,
    SlideKicking,
}

impl AnimFlag {
    /// Flags cleared whenever the attack machine returns to idle
    pub const ATTACK: [AnimFlag; 4] = [
        AnimFlag::Blocking,
        AnimFlag::ChargingAttack,
        AnimFlag::JumpKicking,
        AnimFlag::SlideKicking,
    ];
}

/// Body stance broadcast to presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    Standing,
    Crouching,
    Recovering,
    CrouchRecovering,
}

/// One-way animation and presentation collaborator
pub trait AnimationSink: Send + Sync {
    /// Movement blend value
    fn set_movement(&self, value: f32);

    fn set_flag(&self, flag: AnimFlag, value: bool);

    /// Which basic attack animation to play
    fn set_attack_variant(&self, index: u32);

    /// Playback speed multiplier
    fn set_playback_speed(&self, multiplier: f32);

    fn set_stance(&self, stance: Stance);

    /// Clear attack flags and restore normal playback speed
    fn reset_attack_parameters(&self) {
        for flag in AnimFlag::ATTACK {
            self.set_flag(flag, false);
        }
        self.set_playback_speed(1.0);
    }
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnimator;

impl AnimationSink for NullAnimator {
    fn set_movement(&self, _value: f32) {}
    fn set_flag(&self, _flag: AnimFlag, _value: bool) {}
    fn set_attack_variant(&self, _index: u32) {}
    fn set_playback_speed(&self, _multiplier: f32) {}
    fn set_stance(&self, _stance: Stance) {}
}

#[derive(Debug)]
struct AnimatorState {
    movement: f32,
    flags: HashMap<AnimFlag, bool>,
    attack_variant: u32,
    playback_speed: f32,
    stance: Stance,
    stance_changes: Vec<Stance>,
}

impl Default for AnimatorState {
    fn default() -> Self {
        Self {
            movement: 0.0,
            flags: HashMap::new(),
            attack_variant: 0,
            playback_speed: 1.0,
            stance: Stance::Standing,
            stance_changes: Vec::new(),
        }
    }
}

/// Sink that remembers the latest value of every parameter
#[derive(Debug, Default)]
pub struct RecordingAnimator {
    state: Mutex<AnimatorState>,
}

impl RecordingAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn movement(&self) -> f32 {
        self.state.lock().movement
    }

    /// Latest value of a flag, false if never set
    pub fn flag(&self, flag: AnimFlag) -> bool {
        self.state.lock().flags.get(&flag).copied().unwrap_or(false)
    }

    pub fn attack_variant(&self) -> u32 {
        self.state.lock().attack_variant
    }

    pub fn playback_speed(&self) -> f32 {
        self.state.lock().playback_speed
    }

    pub fn stance(&self) -> Stance {
        self.state.lock().stance
    }

    /// Every stance notification in order
    pub fn stance_changes(&self) -> Vec<Stance> {
        self.state.lock().stance_changes.clone()
    }
}

impl AnimationSink for RecordingAnimator {
    fn set_movement(&self, value: f32) {
        self.state.lock().movement = value;
    }

    fn set_flag(&self, flag: AnimFlag, value: bool) {
        self.state.lock().flags.insert(flag, value);
    }

    fn set_attack_variant(&self, index: u32) {
        self.state.lock().attack_variant = index;
    }

    fn set_playback_speed(&self, multiplier: f32) {
        self.state.lock().playback_speed = multiplier;
    }

    fn set_stance(&self, stance: Stance) {
        let mut state = self.state.lock();
        state.stance = stance;
        state.stance_changes.push(stance);
    }
}
