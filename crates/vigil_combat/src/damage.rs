//! Damage information and delivery

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use vigil_math::Vec3;

/// Which move produced the damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    /// Enemy melee swing
    Melee,
    BasicAttack,
    ChargeAttack,
    JumpKick,
    SlideKick,
    /// Scripted or environmental damage
    Other,
}

impl Default for DamageKind {
    fn default() -> Self {
        Self::Other
    }
}

/// Information about a damage instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageInfo {
    /// Damage amount
    pub amount: f32,
    pub kind: DamageKind,
    /// Entity that caused the damage (if any)
    pub source_entity: Option<u64>,
    /// World position of the hit
    pub hit_point: Option<Vec3>,
}

impl DamageInfo {
    /// Create new damage info
    pub fn new(amount: f32, kind: DamageKind) -> Self {
        Self {
            amount,
            kind,
            source_entity: None,
            hit_point: None,
        }
    }

    /// Set the source entity
    pub fn with_source(mut self, entity: u64) -> Self {
        self.source_entity = Some(entity);
        self
    }

    /// Set the hit point
    pub fn with_hit_point(mut self, point: Vec3) -> Self {
        self.hit_point = Some(point);
        self
    }
}

impl Default for DamageInfo {
    fn default() -> Self {
        Self::new(0.0, DamageKind::Other)
    }
}

/// Receiver of outgoing damage. Fire-and-forget.
pub trait DamageSink {
    fn apply_damage(&self, target: u64, damage: DamageInfo);
}

/// Sink that keeps every delivered hit, used by the sandbox and tests
#[derive(Debug, Default)]
pub struct RecordingDamageSink {
    delivered: Mutex<Vec<(u64, DamageInfo)>>,
}

impl RecordingDamageSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything delivered so far
    pub fn take(&self) -> Vec<(u64, DamageInfo)> {
        std::mem::take(&mut *self.delivered.lock())
    }

    pub fn len(&self) -> usize {
        self.delivered.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.lock().is_empty()
    }

    /// Total damage dealt to `target`
    pub fn total_for(&self, target: u64) -> f32 {
        self.delivered
            .lock()
            .iter()
            .filter(|(t, _)| *t == target)
            .map(|(_, d)| d.amount)
            .sum()
    }
}

impl DamageSink for RecordingDamageSink {
    fn apply_damage(&self, target: u64, damage: DamageInfo) {
        self.delivered.lock().push((target, damage));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_info() {
        let damage = DamageInfo::new(12.0, DamageKind::SlideKick)
            .with_source(7)
            .with_hit_point(Vec3::new(1.0, 1.0, 0.0));

        assert_eq!(damage.amount, 12.0);
        assert_eq!(damage.source_entity, Some(7));
        assert!(damage.hit_point.is_some());
    }

    #[test]
    fn test_recording_sink_totals() {
        let sink = RecordingDamageSink::new();
        sink.apply_damage(1, DamageInfo::new(10.0, DamageKind::BasicAttack));
        sink.apply_damage(2, DamageInfo::new(4.0, DamageKind::Melee));
        sink.apply_damage(1, DamageInfo::new(5.0, DamageKind::JumpKick));

        assert_eq!(sink.total_for(1), 15.0);
        assert_eq!(sink.take().len(), 3);
        assert!(sink.is_empty());
    }
}
