//! # Voxel Resistance
//!
//! How hard a voxel is to blow through, and whether a ray with a given
//! amount of power left may destroy it.
//!
//! The rules are a strategy chosen when the explosion is built: the default
//! reads descriptor resistances straight from the registry, while an
//! entity-derived strategy lets the exploding entity reshape them (a skull
//! that shreds everything but obsidian, a cart that spares rails).

use std::fmt;
use std::sync::Arc;

use blastwave_shared::VoxelPos;

use crate::block::{BlockId, BlockType, Voxel};
use crate::entity::EntityId;
use crate::world::VoxelAccess;

/// Resistance lookups used by the ray tracer.
pub trait VoxelResistanceSource {
    /// Resistance of the voxel at `pos`, or `None` if it holds neither a
    /// block nor a fluid.
    fn resistance_at(&self, pos: VoxelPos) -> Option<f32>;

    /// Whether a ray with `power` left destroys the voxel at `pos`.
    fn should_destroy(&self, power: f32, pos: VoxelPos) -> bool;
}

/// Resistance overrides supplied by the entity that exploded.
///
/// Both methods default to the plain registry behaviour.
pub trait EntityResistanceRules: Send + Sync + fmt::Debug {
    /// Adjusts `base`, the larger of block and fluid resistance.
    fn block_resistance(&self, _pos: VoxelPos, _voxel: &Voxel, _block: &BlockType, base: f32) -> f32 {
        base
    }

    /// Vetoes destruction of individual voxels.
    fn should_destroy(&self, _pos: VoxelPos, _voxel: &Voxel, _block: &BlockType, _power: f32) -> bool {
        true
    }
}

/// Entity-derived strategy: the entity plus its rules.
#[derive(Clone, Debug)]
pub struct EntityResistance {
    /// The exploding entity.
    pub entity: EntityId,
    /// Its overrides.
    pub rules: Arc<dyn EntityResistanceRules>,
}

/// Which rules an explosion uses for resistance.
#[derive(Clone, Debug, Default)]
pub enum ResistanceStrategy {
    /// Registry resistances, every non-empty voxel destructible.
    #[default]
    Default,
    /// Registry resistances adjusted by the exploding entity.
    EntityDerived(EntityResistance),
}

impl ResistanceStrategy {
    /// Entity-derived strategy for `entity`.
    #[must_use]
    pub fn entity_derived(entity: EntityId, rules: Arc<dyn EntityResistanceRules>) -> Self {
        Self::EntityDerived(EntityResistance { entity, rules })
    }
}

/// Caps every resistance at `cap` except for the listed blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct ResistanceCap {
    /// Highest resistance any non-immune block keeps.
    pub cap: f32,
    /// Blocks whose resistance is left alone.
    pub immune: Vec<BlockId>,
}

impl EntityResistanceRules for ResistanceCap {
    fn block_resistance(&self, _pos: VoxelPos, voxel: &Voxel, _block: &BlockType, base: f32) -> f32 {
        if self.immune.contains(&voxel.block.block) {
            base
        } else {
            base.min(self.cap)
        }
    }
}

/// Never destroys the listed blocks; rays still pay their resistance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtectedBlocks {
    /// Blocks that survive.
    pub blocks: Vec<BlockId>,
}

impl EntityResistanceRules for ProtectedBlocks {
    fn should_destroy(&self, _pos: VoxelPos, voxel: &Voxel, _block: &BlockType, _power: f32) -> bool {
        !self.blocks.contains(&voxel.block.block)
    }
}

/// A world seen through a resistance strategy.
pub struct ResistanceView<'a, W: ?Sized> {
    world: &'a W,
    strategy: &'a ResistanceStrategy,
}

impl<'a, W: VoxelAccess + ?Sized> ResistanceView<'a, W> {
    /// Wraps `world` with `strategy`.
    pub fn new(world: &'a W, strategy: &'a ResistanceStrategy) -> Self {
        Self { world, strategy }
    }
}

impl<W: VoxelAccess + ?Sized> VoxelResistanceSource for ResistanceView<'_, W> {
    fn resistance_at(&self, pos: VoxelPos) -> Option<f32> {
        let voxel = self.world.voxel(pos);
        let registry = self.world.registry();
        if registry.is_empty_voxel(&voxel) {
            return None;
        }
        let block = registry.block(voxel.block.block);
        let block_res = if block.air { 0.0 } else { block.resistance };
        let fluid_res = if voxel.fluid.is_empty() {
            0.0
        } else {
            registry.fluid(voxel.fluid.fluid).map_or(0.0, |f| f.resistance)
        };
        let base = block_res.max(fluid_res);
        let resistance = match self.strategy {
            ResistanceStrategy::Default => base,
            ResistanceStrategy::EntityDerived(derived) => {
                derived.rules.block_resistance(pos, &voxel, block, base)
            }
        };
        // Negative overrides would let a ray gain power.
        Some(resistance.max(0.0))
    }

    fn should_destroy(&self, power: f32, pos: VoxelPos) -> bool {
        let voxel = self.world.voxel(pos);
        let registry = self.world.registry();
        if registry.is_empty_voxel(&voxel) {
            return false;
        }
        match self.strategy {
            ResistanceStrategy::Default => true,
            ResistanceStrategy::EntityDerived(derived) => {
                let block = registry.block(voxel.block.block);
                derived.rules.should_destroy(pos, &voxel, block, power)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockState, FluidState};
    use crate::test_support::FakeWorld;

    #[test]
    fn test_air_has_no_resistance() {
        let world = FakeWorld::new();
        let strategy = ResistanceStrategy::Default;
        let view = ResistanceView::new(&world, &strategy);
        let pos = VoxelPos::new(0, 5, 0);
        assert_eq!(view.resistance_at(pos), None);
        assert!(!view.should_destroy(10.0, pos));
    }

    #[test]
    fn test_fluid_dominates_block() {
        let mut world = FakeWorld::new();
        let water = world.registry.fluid_by_name("water").unwrap();
        let pos = VoxelPos::new(1, 1, 1);
        world.put_voxel(pos, Voxel::fluid(FluidState::source(water)));
        let strategy = ResistanceStrategy::Default;
        let view = ResistanceView::new(&world, &strategy);
        assert_eq!(view.resistance_at(pos), Some(100.0));
        assert!(view.should_destroy(1.0, pos));
    }

    #[test]
    fn test_resistance_cap_spares_immune() {
        let mut world = FakeWorld::new();
        let obsidian = world.registry.require("obsidian").unwrap();
        let stone = world.registry.require("stone").unwrap();
        world.put_block(VoxelPos::new(0, 0, 0), BlockState::of(obsidian));
        world.put_block(VoxelPos::new(1, 0, 0), BlockState::of(stone));
        let strategy = ResistanceStrategy::entity_derived(
            EntityId(9),
            Arc::new(ResistanceCap {
                cap: 0.8,
                immune: vec![obsidian],
            }),
        );
        let view = ResistanceView::new(&world, &strategy);
        assert_eq!(view.resistance_at(VoxelPos::new(0, 0, 0)), Some(1200.0));
        assert_eq!(view.resistance_at(VoxelPos::new(1, 0, 0)), Some(0.8));
    }

    #[test]
    fn test_protected_blocks_survive() {
        let mut world = FakeWorld::new();
        let planks = world.registry.require("planks").unwrap();
        world.put_block(VoxelPos::new(0, 0, 0), BlockState::of(planks));
        let strategy = ResistanceStrategy::entity_derived(
            EntityId(1),
            Arc::new(ProtectedBlocks { blocks: vec![planks] }),
        );
        let view = ResistanceView::new(&world, &strategy);
        assert_eq!(view.resistance_at(VoxelPos::new(0, 0, 0)), Some(3.0));
        assert!(!view.should_destroy(100.0, VoxelPos::new(0, 0, 0)));
    }
}
