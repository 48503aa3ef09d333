//! Scripted input timeline
//!
//! Buttons are described as held intervals. Press edges are derived by
//! comparing against the previous frame, the same way a device poll would.

use vigil_character::InputFrame;
use vigil_math::{Quat, Vec2};

#[derive(Debug, Clone, Copy, Default)]
struct Held {
    forward: f32,
    right: f32,
    walk: bool,
    jump: bool,
    crouch: bool,
    primary: bool,
    secondary: bool,
    interact: bool,
    look: Vec2,
}

impl Held {
    fn merge(&mut self, other: &Held) {
        self.forward += other.forward;
        self.right += other.right;
        self.walk |= other.walk;
        self.jump |= other.jump;
        self.crouch |= other.crouch;
        self.primary |= other.primary;
        self.secondary |= other.secondary;
        self.interact |= other.interact;
        self.look = Vec2::new(self.look.x + other.look.x, self.look.y + other.look.y);
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    from: f64,
    to: f64,
    held: Held,
}

fn hold(from: f64, to: f64, held: Held) -> Segment {
    Segment { from, to, held }
}

pub struct Script {
    segments: Vec<Segment>,
    previous: Held,
    duration: f64,
}

impl Script {
    /// Run past the kerb, slide, jump, charge an attack, turn, then close in
    /// on the guard and trade blows
    pub fn courtyard() -> Self {
        let forward = Held { forward: 1.0, ..Default::default() };
        let segments = vec![
            hold(0.0, 2.0, forward),
            hold(1.4, 1.5, Held { crouch: true, ..Default::default() }),
            hold(2.6, 2.7, Held { jump: true, ..Default::default() }),
            hold(2.6, 3.2, forward),
            hold(4.0, 4.25, Held { primary: true, ..Default::default() }),
            hold(5.0, 5.5, Held { look: Vec2::new(0.3, 0.0), ..Default::default() }),
            hold(5.5, 6.0, Held { look: Vec2::new(-0.3, 0.0), ..Default::default() }),
            hold(6.0, 8.0, Held { forward: 1.0, walk: true, ..Default::default() }),
            hold(7.5, 7.55, Held { primary: true, ..Default::default() }),
            hold(8.2, 8.25, Held { primary: true, ..Default::default() }),
            hold(8.6, 9.2, Held { secondary: true, ..Default::default() }),
        ];
        Self {
            segments,
            previous: Held::default(),
            duration: 10.0,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Input and look delta for the tick starting at `now`. The camera
    /// rotation is filled in by the caller.
    pub fn frame(&mut self, now: f64) -> (InputFrame, Vec2) {
        let mut held = Held::default();
        for segment in self.segments.iter().filter(|s| now >= s.from && now < s.to) {
            held.merge(&segment.held);
        }
        let previous = std::mem::replace(&mut self.previous, held);

        let frame = InputFrame {
            move_axis_right: held.right.clamp(-1.0, 1.0),
            move_axis_forward: held.forward.clamp(-1.0, 1.0),
            camera_rotation: Quat::IDENTITY,
            walk: held.walk,
            jump: held.jump && !previous.jump,
            jump_hold: held.jump,
            crouch: held.crouch && !previous.crouch,
            crouch_hold: held.crouch,
            primary_fire: held.primary && !previous.primary,
            primary_fire_hold: held.primary,
            secondary_fire: held.secondary && !previous.secondary,
            secondary_fire_hold: held.secondary,
            interact: held.interact && !previous.interact,
            interact_hold: held.interact,
        };
        (frame, held.look)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_edge_only_on_first_frame() {
        let mut script = Script::courtyard();
        let (first, _) = script.frame(2.6);
        assert!(first.jump);
        assert!(first.jump_hold);

        let (second, _) = script.frame(2.6 + 1.0 / 60.0);
        assert!(!second.jump);
        assert!(second.jump_hold);
    }

    #[test]
    fn test_overlapping_segments_merge() {
        let mut script = Script::courtyard();
        let (frame, _) = script.frame(1.45);
        assert_eq!(frame.move_axis_forward, 1.0);
        assert!(frame.crouch);
    }

    #[test]
    fn test_idle_after_timeline() {
        let mut script = Script::courtyard();
        let (frame, look) = script.frame(9.9);
        assert_eq!(frame, InputFrame::default());
        assert_eq!(look, Vec2::ZERO);
    }
}
