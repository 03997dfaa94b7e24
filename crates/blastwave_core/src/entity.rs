//! # Entity Snapshots
//!
//! Read-only views of entities near an explosion, plus the knockback
//! modifier seam used to dampen impulses (blast protection and friends).

use std::fmt;

use blastwave_shared::{Aabb, Vec3};
use serde::{Deserialize, Serialize};

/// Unique entity identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Player ability flags relevant to knockback replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAbilities {
    /// Creative mode.
    pub creative: bool,
    /// Currently flying.
    pub flying: bool,
    /// Spectator mode.
    pub spectator: bool,
}

impl PlayerAbilities {
    /// Whether this player is pushed by explosions at all.
    #[inline]
    #[must_use]
    pub const fn receives_knockback(&self) -> bool {
        !self.spectator && !(self.creative && self.flying)
    }
}

/// What kind of entity a snapshot describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityCategory {
    /// Mobs and other living things.
    Living {
        /// Summed blast protection level of worn armour.
        blast_protection: u8,
    },
    /// A player.
    Player {
        /// Ability flags.
        abilities: PlayerAbilities,
        /// Summed blast protection level of worn armour.
        blast_protection: u8,
    },
    /// Items, falling blocks, projectiles.
    Physics,
    /// A lit explosive; measured from its feet, not its eyes.
    PrimedExplosive,
}

/// An entity as seen by the impact resolver.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Identity.
    pub id: EntityId,
    /// Feet position.
    pub position: Vec3,
    /// Eye height above the feet.
    pub eye_height: f64,
    /// Collision box in world space.
    pub bounds: Aabb,
    /// Category.
    pub category: EntityCategory,
    /// Never affected by any explosion.
    pub explosion_immune: bool,
    /// Opted out of explosions (spectators, markers).
    pub ignores_explosions: bool,
}

impl EntitySnapshot {
    /// Snapshot of a box-shaped entity standing at `position`.
    #[must_use]
    pub fn new(id: EntityId, position: Vec3, width: f64, height: f64, category: EntityCategory) -> Self {
        Self {
            id,
            position,
            eye_height: height * 0.85,
            bounds: Aabb::from_feet(position, width, height),
            category,
            explosion_immune: false,
            ignores_explosions: false,
        }
    }

    /// Point the push direction is measured from.
    #[must_use]
    pub fn reference_point(&self) -> Vec3 {
        match self.category {
            EntityCategory::PrimedExplosive => self.position,
            _ => self.position + Vec3::new(0.0, self.eye_height, 0.0),
        }
    }

    /// True for players whose client needs the knockback replayed.
    #[must_use]
    pub fn is_replay_target(&self) -> bool {
        matches!(
            self.category,
            EntityCategory::Player { abilities, .. } if abilities.receives_knockback()
        )
    }

    /// Blast protection level, zero for non-living entities.
    #[must_use]
    pub fn blast_protection(&self) -> u8 {
        match self.category {
            EntityCategory::Living { blast_protection }
            | EntityCategory::Player { blast_protection, .. } => blast_protection,
            EntityCategory::Physics | EntityCategory::PrimedExplosive => 0,
        }
    }
}

/// Scales an entity's knockback before it is applied.
pub trait KnockbackModifier: Send + Sync + fmt::Debug {
    /// Returns the dampened scale for `entity` given the raw `scale`.
    fn dampen(&self, entity: &EntitySnapshot, scale: f64) -> f64;
}

/// Leaves knockback untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityKnockback;

impl KnockbackModifier for IdentityKnockback {
    fn dampen(&self, _entity: &EntitySnapshot, scale: f64) -> f64 {
        scale
    }
}

/// Reduces knockback by 15% per blast protection level, rounded down in
/// whole units of `scale`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlastProtectionDampener;

impl KnockbackModifier for BlastProtectionDampener {
    fn dampen(&self, entity: &EntitySnapshot, scale: f64) -> f64 {
        let level = f64::from(entity.blast_protection());
        if level <= 0.0 {
            return scale;
        }
        (scale - (scale * level * 0.15).floor()).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(abilities: PlayerAbilities) -> EntitySnapshot {
        EntitySnapshot::new(
            EntityId(1),
            Vec3::ZERO,
            0.6,
            1.8,
            EntityCategory::Player {
                abilities,
                blast_protection: 0,
            },
        )
    }

    #[test]
    fn test_reference_point_uses_eyes() {
        let zombie = EntitySnapshot::new(
            EntityId(2),
            Vec3::new(1.0, 2.0, 3.0),
            0.6,
            2.0,
            EntityCategory::Living { blast_protection: 0 },
        );
        assert!((zombie.reference_point().y - 3.7).abs() < 1e-9);
    }

    #[test]
    fn test_primed_explosive_uses_feet() {
        let tnt = EntitySnapshot::new(
            EntityId(3),
            Vec3::new(1.0, 2.0, 3.0),
            0.98,
            0.98,
            EntityCategory::PrimedExplosive,
        );
        assert_eq!(tnt.reference_point(), tnt.position);
    }

    #[test]
    fn test_replay_targets() {
        assert!(player(PlayerAbilities::default()).is_replay_target());
        assert!(!player(PlayerAbilities {
            spectator: true,
            ..PlayerAbilities::default()
        })
        .is_replay_target());
        assert!(!player(PlayerAbilities {
            creative: true,
            flying: true,
            spectator: false,
        })
        .is_replay_target());
        assert!(player(PlayerAbilities {
            creative: true,
            flying: false,
            spectator: false,
        })
        .is_replay_target());
    }

    #[test]
    fn test_blast_protection_dampens() {
        let mut zombie = EntitySnapshot::new(
            EntityId(4),
            Vec3::ZERO,
            0.6,
            1.95,
            EntityCategory::Living { blast_protection: 4 },
        );
        // 10 * 4 * 0.15 = 6
        assert!((BlastProtectionDampener.dampen(&zombie, 10.0) - 4.0).abs() < 1e-9);
        zombie.category = EntityCategory::Physics;
        assert!((BlastProtectionDampener.dampen(&zombie, 10.0) - 10.0).abs() < 1e-9);
        assert!((IdentityKnockback.dampen(&zombie, 0.5) - 0.5).abs() < 1e-9);
    }
}
