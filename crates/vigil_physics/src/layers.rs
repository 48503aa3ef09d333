//! Collision layers and masks

use serde::{Deserialize, Serialize};

/// A collision layer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionLayer(pub u32);

impl CollisionLayer {
    /// Default layer
    pub const DEFAULT: Self = Self(0);
    /// Player hurtboxes
    pub const PLAYER: Self = Self(1);
    /// Enemy hurtboxes
    pub const ENEMIES: Self = Self(2);
    /// Static level geometry
    pub const ENVIRONMENT: Self = Self(3);
    /// Trigger volumes, never solid
    pub const TRIGGERS: Self = Self(4);

    /// Get the layer as a bitmask
    pub fn as_mask(&self) -> u32 {
        1 << self.0
    }
}

impl Default for CollisionLayer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Set of layers a query or motor interacts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: Self = Self(u32::MAX);
    pub const NONE: Self = Self(0);

    /// Mask covering the given layers
    pub fn from_layers(layers: &[CollisionLayer]) -> Self {
        Self(layers.iter().fold(0u32, |acc, l| acc | l.as_mask()))
    }

    /// Solid geometry a walking character collides with
    pub fn character_default() -> Self {
        Self::from_layers(&[CollisionLayer::DEFAULT, CollisionLayer::ENVIRONMENT])
    }

    pub fn contains(&self, layer: CollisionLayer) -> bool {
        self.0 & layer.as_mask() != 0
    }

    pub fn with(mut self, layer: CollisionLayer) -> Self {
        self.0 |= layer.as_mask();
        self
    }

    pub fn without(mut self, layer: CollisionLayer) -> Self {
        self.0 &= !layer.as_mask();
        self
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::character_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_membership() {
        let mask = LayerMask::from_layers(&[CollisionLayer::PLAYER]);
        assert!(mask.contains(CollisionLayer::PLAYER));
        assert!(!mask.contains(CollisionLayer::ENEMIES));
        let mask = mask.with(CollisionLayer::ENEMIES).without(CollisionLayer::PLAYER);
        assert!(mask.contains(CollisionLayer::ENEMIES));
        assert!(!mask.contains(CollisionLayer::PLAYER));
    }

    #[test]
    fn test_character_default_skips_actor_layers() {
        let mask = LayerMask::character_default();
        assert!(mask.contains(CollisionLayer::ENVIRONMENT));
        assert!(!mask.contains(CollisionLayer::PLAYER));
        assert!(!mask.contains(CollisionLayer::TRIGGERS));
    }
}
