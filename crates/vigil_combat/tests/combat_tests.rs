//! Integration tests for vigil_combat

use std::collections::HashMap;
use vigil_combat::prelude::*;
use vigil_math::{Aabb, Quat, Vec3};
use vigil_physics::{CollisionLayer, StaticWorld};

#[test]
fn test_overkill_then_noop() {
    let mut status = Status::new(1, 10.0);

    let events = status.take_damage(&DamageInfo::new(15.0, DamageKind::ChargeAttack));
    assert_eq!(status.state(), HealthState::Dead);
    assert!(events.iter().any(|e| matches!(e, HealthEvent::Death { entity: 1, .. })));

    for _ in 0..3 {
        assert!(status.take_damage(&DamageInfo::new(15.0, DamageKind::ChargeAttack)).is_empty());
    }
    assert_eq!(status.health(), -5.0);
}

#[test]
fn test_swing_damages_every_enemy_in_reach_once() {
    let mut world = StaticWorld::new();
    world.add_ground(0.0, 20.0);
    let mut statuses = HashMap::new();
    for (owner, x) in [(20u64, -0.3f32), (21, 0.3)] {
        world.add_owned_box(
            Aabb::new(Vec3::new(x - 0.2, 0.0, 0.8), Vec3::new(x + 0.2, 1.8, 1.2)),
            CollisionLayer::ENEMIES,
            owner,
        );
        statuses.insert(owner, Status::new(owner, 25.0));
    }

    let sink = RecordingDamageSink::new();
    let mut hits = HitRegistry::new();
    let damage = DamageInfo::new(10.0, DamageKind::BasicAttack).with_source(1);

    // Three ticks of an active kick window
    for _ in 0..3 {
        strike(&MeleeHitbox::player(), &world, Vec3::ZERO, Quat::IDENTITY, &damage, &mut hits, &sink);
    }

    for (target, info) in sink.take() {
        if let Some(status) = statuses.get_mut(&target) {
            status.take_damage(&info);
        }
    }
    assert_eq!(statuses[&20].health(), 15.0);
    assert_eq!(statuses[&21].health(), 15.0);
    assert_eq!(hits.len(), 2);
}
