//! # Explosion-Hit Handlers
//!
//! The per-block capability invoked by the committer for every affected
//! voxel. A handler decides what the voxel drops and what replaces it; the
//! committer only merges drops and applies the replacement.

use std::fmt;
use std::sync::Arc;

use blastwave_shared::VoxelPos;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::block::{BlockState, BlockType};
use crate::error::BlockHandlerError;
use crate::explosion::BlockInteraction;
use crate::item::ItemStack;

/// Context handed to a block's handler.
#[derive(Clone, Copy, Debug)]
pub struct ExplosionHit<'a> {
    /// Voxel being resolved.
    pub pos: VoxelPos,
    /// Its current block state.
    pub state: BlockState,
    /// Its block descriptor.
    pub block: &'a BlockType,
    /// Interaction mode of the explosion.
    pub interaction: BlockInteraction,
    /// Explosion radius (drives decay odds).
    pub radius: f32,
}

/// What a handler wants done with its voxel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HitResult {
    /// Stacks to drop at the voxel.
    pub drops: Vec<ItemStack>,
    /// New state for the voxel; `None` leaves it untouched.
    pub replacement: Option<BlockState>,
}

impl HitResult {
    /// Leaves the voxel as it is.
    #[must_use]
    pub fn untouched() -> Self {
        Self::default()
    }

    /// Clears the voxel to air, dropping `drops`.
    #[must_use]
    pub fn removed(drops: Vec<ItemStack>) -> Self {
        Self {
            drops,
            replacement: Some(BlockState::AIR),
        }
    }
}

/// Block-specific reaction to being reached by an explosion.
pub trait ExplosionHitHandler: Send + Sync + fmt::Debug {
    /// Resolves one voxel.
    ///
    /// # Errors
    ///
    /// A handler that cannot interpret its block state returns an error; the
    /// committer stops and propagates it.
    fn on_explosion_hit(
        &self,
        hit: &ExplosionHit<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<HitResult, BlockHandlerError>;
}

/// Built-in handler selector, used by TOML registries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// Drop the block's item, subject to decay.
    #[default]
    DropSelf,
    /// Remove without dropping anything.
    NoDrops,
    /// Toggle under `TriggerOnly`, otherwise behave like `DropSelf`.
    Trigger,
}

impl HandlerKind {
    /// Instantiates the handler.
    #[must_use]
    pub fn handler(self) -> Arc<dyn ExplosionHitHandler> {
        match self {
            Self::DropSelf => Arc::new(DropSelf),
            Self::NoDrops => Arc::new(NoDrops),
            Self::Trigger => Arc::new(Trigger),
        }
    }
}

/// Drops the block's own item and clears the voxel.
///
/// Under [`BlockInteraction::DestroyWithDecay`] the drop survives with
/// probability `1 / radius`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DropSelf;

impl ExplosionHitHandler for DropSelf {
    fn on_explosion_hit(
        &self,
        hit: &ExplosionHit<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<HitResult, BlockHandlerError> {
        if !hit.interaction.is_destructive() {
            return Ok(HitResult::untouched());
        }
        Ok(HitResult::removed(own_drop(hit, rng).into_iter().collect()))
    }
}

/// Clears the voxel without dropping anything (glass, primed explosives).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDrops;

impl ExplosionHitHandler for NoDrops {
    fn on_explosion_hit(
        &self,
        hit: &ExplosionHit<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<HitResult, BlockHandlerError> {
        if !hit.interaction.is_destructive() {
            return Ok(HitResult::untouched());
        }
        Ok(HitResult::removed(Vec::new()))
    }
}

/// Buttons, levers, bells: flips the low meta bit when triggered.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trigger;

impl ExplosionHitHandler for Trigger {
    fn on_explosion_hit(
        &self,
        hit: &ExplosionHit<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<HitResult, BlockHandlerError> {
        match hit.interaction {
            BlockInteraction::Keep => Ok(HitResult::untouched()),
            BlockInteraction::TriggerOnly => {
                if hit.state.meta > 1 {
                    return Err(BlockHandlerError::UnsupportedState {
                        block: hit.block.name.clone(),
                        meta: hit.state.meta,
                    });
                }
                Ok(HitResult {
                    drops: Vec::new(),
                    replacement: Some(BlockState::with_meta(hit.state.block, hit.state.meta ^ 1)),
                })
            }
            BlockInteraction::Destroy | BlockInteraction::DestroyWithDecay => {
                Ok(HitResult::removed(own_drop(hit, rng).into_iter().collect()))
            }
        }
    }
}

fn own_drop(hit: &ExplosionHit<'_>, rng: &mut dyn RngCore) -> Option<ItemStack> {
    let item = hit.block.drop_item?;
    if hit.interaction == BlockInteraction::DestroyWithDecay && hit.radius > 0.0 {
        let survive = 1.0 / hit.radius;
        if rng.gen::<f32>() > survive {
            return None;
        }
    }
    Some(ItemStack::new(item, 1).with_max_stack(hit.block.drop_max_stack))
}
