//! # World Collaborators
//!
//! The capabilities an explosion needs from its host world, split by
//! concern so tests can fake only what they exercise.
//!
//! | trait | used by |
//! |---|---|
//! | [`VoxelAccess`] | ray tracing, commit |
//! | [`CollisionQuery`] | exposure |
//! | [`EntityAccess`] | impact resolution |
//! | [`WorldMutation`] | commit |
//! | [`EffectSink`] | finalize |

use blastwave_shared::{Aabb, ParticleKind, SoundId, Vec3, VoxelPos};

use crate::block::{BlockRegistry, BlockState, Voxel};
use crate::damage::DamageSource;
use crate::entity::{EntityId, EntitySnapshot};
use crate::item::ItemStack;

/// Flags passed along with voxel writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetFlags(u8);

impl SetFlags {
    /// No side effects.
    pub const NONE: Self = Self(0);
    /// Neighbouring voxels get an update.
    pub const NOTIFY_NEIGHBORS: Self = Self(1 << 0);
    /// Clients are sent the change.
    pub const SYNC_CLIENTS: Self = Self(1 << 1);
    /// What explosions use.
    pub const DEFAULT: Self = Self(Self::NOTIFY_NEIGHBORS.0 | Self::SYNC_CLIENTS.0);

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Checks if a specific flag is set.
    #[inline]
    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    /// Combines two flag sets.
    #[inline]
    #[must_use]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }
}

impl Default for SetFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Read access to voxels.
pub trait VoxelAccess {
    /// Block and fluid descriptors.
    fn registry(&self) -> &BlockRegistry;

    /// Contents of a voxel. Unloaded voxels read as air.
    fn voxel(&self, pos: VoxelPos) -> Voxel;

    /// True if `pos` lies above or below the buildable range.
    fn is_outside_build_height(&self, pos: VoxelPos) -> bool;
}

/// Line-of-sight queries against collision shapes.
pub trait CollisionQuery {
    /// True if the segment from `from` to `to` is blocked by any collidable
    /// voxel.
    fn collides(&self, from: Vec3, to: Vec3) -> bool;
}

/// Write access to voxels and dropped items.
pub trait WorldMutation {
    /// Replaces a voxel. Returns false if the world refused the write.
    fn set_voxel(&mut self, pos: VoxelPos, state: BlockState, flags: SetFlags) -> bool;

    /// Spawns a dropped item stack at `position`.
    fn emit_item_drop(&mut self, stack: ItemStack, position: Vec3);
}

/// Entity lookup and impact delivery.
pub trait EntityAccess {
    /// Entities whose bounds intersect `area`.
    fn entities_in_box(&self, area: &Aabb) -> Vec<EntitySnapshot>;

    /// Applies damage and adds `impulse` to the entity's velocity.
    ///
    /// Returns false if the entity no longer exists.
    fn apply_impact(&mut self, entity: EntityId, source: &DamageSource, damage: f32, impulse: Vec3) -> bool;
}

/// Audio-visual feedback.
pub trait EffectSink {
    /// Plays a positioned sound.
    fn play_effect(&mut self, sound: &SoundId, position: Vec3, volume: f32, pitch: f32);

    /// Spawns a particle.
    fn spawn_particle(&mut self, kind: ParticleKind, position: Vec3, velocity: Vec3);
}

/// Everything an explosion needs, as one bound.
pub trait ExplosionWorld: VoxelAccess + CollisionQuery + WorldMutation + EntityAccess + EffectSink {}

impl<T> ExplosionWorld for T where T: VoxelAccess + CollisionQuery + WorldMutation + EntityAccess + EffectSink {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let flags = SetFlags::default();
        assert!(flags.has(SetFlags::NOTIFY_NEIGHBORS));
        assert!(flags.has(SetFlags::SYNC_CLIENTS));
        assert!(!SetFlags::NONE.has(SetFlags::SYNC_CLIENTS));
        assert_eq!(SetFlags::NONE.with(SetFlags::SYNC_CLIENTS).raw(), 2);
    }
}
