//! Health and status model shared by the player and enemies

use crate::damage::DamageInfo;
use serde::{Deserialize, Serialize};

/// What an actor's body is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthState {
    FreeMoving,
    Staggered,
    KnockedBack,
    Dead,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::FreeMoving
    }
}

/// Events emitted by the status model
#[derive(Debug, Clone, PartialEq)]
pub enum HealthEvent {
    /// Damage was taken
    DamageTaken {
        entity: u64,
        damage: DamageInfo,
        new_health: f32,
    },
    /// Entity died and should be torn down
    Death { entity: u64, killer: Option<u64> },
}

/// Linear health counter with a status enumeration
///
/// Health may go negative on the killing blow. Once dead, every mutating
/// call is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    entity: u64,
    health: f32,
    max_health: f32,
    state: HealthState,
}

impl Status {
    pub fn new(entity: u64, max_health: f32) -> Self {
        Self {
            entity,
            health: max_health,
            max_health,
            state: HealthState::FreeMoving,
        }
    }

    pub fn entity(&self) -> u64 {
        self.entity
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state == HealthState::Dead
    }

    pub fn is_free_moving(&self) -> bool {
        self.state == HealthState::FreeMoving
    }

    pub fn is_staggered(&self) -> bool {
        self.state == HealthState::Staggered
    }

    pub fn is_knocked_back(&self) -> bool {
        self.state == HealthState::KnockedBack
    }

    /// Subtract `damage.amount`; reaching zero or below kills
    pub fn take_damage(&mut self, damage: &DamageInfo) -> Vec<HealthEvent> {
        if self.is_dead() {
            return Vec::new();
        }

        self.health -= damage.amount;
        let mut events = vec![HealthEvent::DamageTaken {
            entity: self.entity,
            damage: damage.clone(),
            new_health: self.health,
        }];

        if self.health <= 0.0 {
            self.state = HealthState::Dead;
            log::info!("Entity {} died ({} health)", self.entity, self.health);
            events.push(HealthEvent::Death {
                entity: self.entity,
                killer: damage.source_entity,
            });
        }

        events
    }

    pub fn become_free_moving(&mut self) {
        self.set_state(HealthState::FreeMoving);
    }

    pub fn become_staggered(&mut self) {
        self.set_state(HealthState::Staggered);
    }

    pub fn become_knocked_back(&mut self) {
        self.set_state(HealthState::KnockedBack);
    }

    fn set_state(&mut self, state: HealthState) {
        if !self.is_dead() {
            self.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::DamageKind;

    #[test]
    fn test_lethal_damage_kills() {
        let mut status = Status::new(3, 10.0);
        let events = status.take_damage(&DamageInfo::new(15.0, DamageKind::Melee).with_source(9));

        assert_eq!(status.state(), HealthState::Dead);
        assert_eq!(status.health(), -5.0);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], HealthEvent::Death { entity: 3, killer: Some(9) }));
    }

    #[test]
    fn test_damage_after_death_is_noop() {
        let mut status = Status::new(3, 10.0);
        status.take_damage(&DamageInfo::new(15.0, DamageKind::Melee));

        let events = status.take_damage(&DamageInfo::new(15.0, DamageKind::Melee));
        assert!(events.is_empty());
        assert_eq!(status.health(), -5.0);

        status.become_free_moving();
        assert!(status.is_dead());
    }

    #[test]
    fn test_non_lethal_damage() {
        let mut status = Status::new(1, 100.0);
        let events = status.take_damage(&DamageInfo::new(30.0, DamageKind::BasicAttack));
        assert_eq!(events.len(), 1);
        assert_eq!(status.health(), 70.0);
        assert!(status.is_free_moving());
    }

    #[test]
    fn test_status_setters() {
        let mut status = Status::new(1, 100.0);
        status.become_staggered();
        assert!(status.is_staggered());
        status.become_knocked_back();
        assert!(status.is_knocked_back());
        status.become_free_moving();
        assert!(status.is_free_moving());
    }
}
