//! Crouch latch with deferred uncrouch
//!
//! Entering the crouched capsule happens immediately. Standing back up is
//! only attempted from [`CrouchLatch::resolve_uncrouch`], once per tick, and
//! only succeeds when the standing capsule fits.

use crate::animation::{AnimFlag, AnimationSink, Stance};
use vigil_physics::{CapsuleShape, ColliderHandle, CollisionQuery, KinematicMotor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrouchLatch {
    should_be_crouching: bool,
    is_crouching: bool,
    announce_stance: bool,
}

impl CrouchLatch {
    /// `announce_stance` controls whether stance changes are broadcast
    pub fn new(announce_stance: bool) -> Self {
        Self {
            should_be_crouching: false,
            is_crouching: false,
            announce_stance,
        }
    }

    /// Whether the owner wants to be crouched
    pub fn should_be_crouching(&self) -> bool {
        self.should_be_crouching
    }

    /// Whether the crouched capsule is in use
    pub fn is_crouching(&self) -> bool {
        self.is_crouching
    }

    /// Latch on and switch to the crouched capsule. Already crouched is a
    /// no-op for the capsule.
    pub fn crouch(&mut self, motor: &mut KinematicMotor, animator: &dyn AnimationSink) {
        self.should_be_crouching = true;
        if self.is_crouching {
            return;
        }

        self.is_crouching = true;
        motor.set_capsule(CapsuleShape::CROUCHING);
        animator.set_flag(AnimFlag::Crouching, true);
        if self.announce_stance {
            animator.set_stance(Stance::Crouching);
        }
    }

    /// Latch off. The capsule stays crouched until the next resolve.
    pub fn release(&mut self) {
        self.should_be_crouching = false;
    }

    /// Flip the latch, crouching immediately when it turns on. Returns the
    /// new latch value.
    pub fn toggle(&mut self, motor: &mut KinematicMotor, animator: &dyn AnimationSink) -> bool {
        if self.should_be_crouching {
            self.release();
        } else {
            self.crouch(motor, animator);
        }
        self.should_be_crouching
    }

    /// Try to stand up if the latch is off. Returns true when the standing
    /// capsule was restored.
    pub fn resolve_uncrouch(
        &mut self,
        motor: &mut KinematicMotor,
        world: &dyn CollisionQuery,
        valid: &dyn Fn(ColliderHandle) -> bool,
        animator: &dyn AnimationSink,
    ) -> bool {
        if !self.is_crouching || self.should_be_crouching {
            return false;
        }

        motor.set_capsule(CapsuleShape::STANDING);
        let blocking = motor.character_overlap(world, valid);
        if !blocking.is_empty() {
            log::trace!("Uncrouch blocked by {} colliders", blocking.len());
            motor.set_capsule(CapsuleShape::CROUCHING);
            return false;
        }

        self.is_crouching = false;
        animator.set_flag(AnimFlag::Crouching, false);
        if self.announce_stance {
            animator.set_stance(Stance::Standing);
        }
        true
    }
}

impl Default for CrouchLatch {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::RecordingAnimator;
    use vigil_math::{Aabb, Vec3};
    use vigil_physics::{CollisionLayer, MotorConfig, StaticWorld};

    fn motor() -> KinematicMotor {
        KinematicMotor::new(Vec3::ZERO, MotorConfig::default()).unwrap()
    }

    #[test]
    fn test_double_toggle_returns_to_standing() {
        let mut world = StaticWorld::new();
        world.add_ground(0.0, 10.0);
        let mut motor = motor();
        let animator = RecordingAnimator::new();
        let mut latch = CrouchLatch::default();

        assert!(latch.toggle(&mut motor, &animator));
        assert!(!latch.toggle(&mut motor, &animator));
        assert!(latch.is_crouching());
        assert_eq!(motor.capsule(), CapsuleShape::CROUCHING);

        assert!(latch.resolve_uncrouch(&mut motor, &world, &|_| true, &animator));
        assert!(!latch.is_crouching());
        assert_eq!(motor.capsule(), CapsuleShape::STANDING);
        assert_eq!(animator.stance_changes(), vec![Stance::Crouching, Stance::Standing]);
    }

    #[test]
    fn test_crouch_is_idempotent() {
        let mut motor = motor();
        let animator = RecordingAnimator::new();
        let mut latch = CrouchLatch::default();

        latch.crouch(&mut motor, &animator);
        latch.crouch(&mut motor, &animator);

        assert_eq!(animator.stance_changes(), vec![Stance::Crouching]);
    }

    #[test]
    fn test_uncrouch_waits_for_headroom() {
        let mut world = StaticWorld::new();
        world.add_ground(0.0, 10.0);
        let ceiling = world.add_box(
            Aabb::new(Vec3::new(-2.0, 1.2, -2.0), Vec3::new(2.0, 1.5, 2.0)),
            CollisionLayer::ENVIRONMENT,
        );
        let mut motor = motor();
        let animator = RecordingAnimator::new();
        let mut latch = CrouchLatch::default();

        latch.crouch(&mut motor, &animator);
        latch.release();
        assert!(!latch.resolve_uncrouch(&mut motor, &world, &|_| true, &animator));
        assert!(latch.is_crouching());
        assert_eq!(motor.capsule(), CapsuleShape::CROUCHING);

        // Ignoring the ceiling lets the capsule stand
        assert!(latch.resolve_uncrouch(&mut motor, &world, &|c| c != ceiling, &animator));
        assert!(!animator.flag(AnimFlag::Crouching));
    }
}
