//! Damage sources attached to explosion impacts.

use blastwave_shared::Vec3;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Damage type of an explosion hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageKind {
    /// Explosion with no player behind it.
    Explosion,
    /// Explosion caused (directly or indirectly) by a player.
    PlayerExplosion,
}

/// Describes who and what damaged an entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageSource {
    /// Damage type.
    pub kind: DamageKind,
    /// Entity ultimately responsible (the player who lit the fuse).
    pub causing_entity: Option<EntityId>,
    /// Entity that dealt the damage (the primed explosive itself).
    pub direct_entity: Option<EntityId>,
    /// Where the damage came from.
    pub position: Option<Vec3>,
}

impl DamageSource {
    /// Plain explosion damage from `position`.
    #[must_use]
    pub const fn explosion(position: Vec3) -> Self {
        Self {
            kind: DamageKind::Explosion,
            causing_entity: None,
            direct_entity: None,
            position: Some(position),
        }
    }

    /// Explosion damage attributed to `player`.
    #[must_use]
    pub const fn player_explosion(player: EntityId, position: Vec3) -> Self {
        Self {
            kind: DamageKind::PlayerExplosion,
            causing_entity: Some(player),
            direct_entity: None,
            position: Some(position),
        }
    }

    /// Sets the entity that dealt the damage.
    #[must_use]
    pub const fn with_direct(mut self, entity: EntityId) -> Self {
        self.direct_entity = Some(entity);
        self
    }

    /// True if a player is credited with this damage.
    #[must_use]
    pub const fn is_player_caused(&self) -> bool {
        matches!(self.kind, DamageKind::PlayerExplosion)
    }
}
