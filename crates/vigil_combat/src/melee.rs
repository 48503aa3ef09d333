//! Instantaneous melee strikes
//!
//! A strike is a one-shot oriented box overlap performed the moment an attack lands,
//! not a trigger volume tracked over time. The [`HitRegistry`] passed in
//! keeps every target to one hit per swing.

use crate::damage::{DamageInfo, DamageSink};
use crate::hits::HitRegistry;
use serde::{Deserialize, Serialize};
use vigil_math::{Quat, Vec3};
use vigil_physics::{CollisionLayer, CollisionQuery, LayerMask, QueryFilter};

/// Hitbox placed in front of the attacker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeleeHitbox {
    pub half_extents: Vec3,
    /// Distance of the box center in front of the attacker
    pub reach: f32,
    /// Height of the box center above the feet
    pub height: f32,
    pub targets: LayerMask,
}

impl MeleeHitbox {
    /// Player fists and feet, hits enemies
    pub fn player() -> Self {
        Self {
            half_extents: Vec3::new(0.5, 0.6, 0.5),
            reach: 0.8,
            height: 1.0,
            targets: LayerMask::from_layers(&[CollisionLayer::ENEMIES]),
        }
    }

    /// Enemy swing, a box 0.5 in front of the attacker that hits the player
    pub fn enemy() -> Self {
        Self {
            half_extents: Vec3::new(0.4, 0.6, 0.4),
            reach: 0.5,
            height: 1.0,
            targets: LayerMask::from_layers(&[CollisionLayer::PLAYER]),
        }
    }

    pub fn with_targets(mut self, targets: LayerMask) -> Self {
        self.targets = targets;
        self
    }

    /// Hitbox center for an attacker standing at `position` facing
    /// `rotation`. The box shares the attacker's rotation.
    pub fn center(&self, position: Vec3, rotation: Quat) -> Vec3 {
        position + rotation.up() * self.height + rotation.forward() * self.reach
    }
}

/// Strike everything the hitbox overlaps
///
/// Colliders without an owner, the attacker itself and targets already in
/// `hits` are skipped. Returns the owners damaged by this call.
pub fn strike(
    hitbox: &MeleeHitbox,
    world: &dyn CollisionQuery,
    position: Vec3,
    rotation: Quat,
    damage: &DamageInfo,
    hits: &mut HitRegistry,
    sink: &dyn DamageSink,
) -> Vec<u64> {
    let center = hitbox.center(position, rotation);
    let filter = QueryFilter::new(hitbox.targets);
    let mut struck = Vec::new();

    for collider in world.overlap_box(center, hitbox.half_extents, rotation, &filter) {
        let Some(owner) = world.owner_of(collider) else {
            continue;
        };
        if damage.source_entity == Some(owner) || !hits.register(owner) {
            continue;
        }
        log::debug!("{:?} hit entity {} for {}", damage.kind, owner, damage.amount);
        sink.apply_damage(owner, damage.clone().with_hit_point(center));
        struck.push(owner);
    }

    struck
}
