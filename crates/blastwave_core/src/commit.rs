//! # Destruction Commit
//!
//! The second phase of an explosion: converts affected voxels into drops and
//! replacements, writes them to the world, then optionally lights fires.
//!
//! ## Ordering
//!
//! Voxels are shuffled before conversion so drop merging does not favour
//! any corner of the blast. Drops are merged across the whole detonation
//! and emitted once every voxel has been converted, or as soon as a handler
//! fails, so drops from voxels already removed are never lost.

use blastwave_shared::VoxelPos;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use tracing::{debug, trace, warn};

use crate::block::BlockState;
use crate::config::ExplosionConfig;
use crate::error::{BlockHandlerError, ExplosionError, ExplosionResult};
use crate::explosion::{BlockInteraction, Explosion};
use crate::handler::{ExplosionHit, HitResult};
use crate::item::ItemStack;
use crate::ray::AffectedVoxelSet;
use crate::world::{SetFlags, VoxelAccess, WorldMutation};

/// Merges same-item drops into capped stacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropAccumulator {
    cap: u32,
    entries: Vec<(ItemStack, VoxelPos)>,
}

impl DropAccumulator {
    /// Creates an empty accumulator whose merged stacks hold at most `cap`.
    #[must_use]
    pub fn new(cap: u32) -> Self {
        Self {
            cap,
            entries: Vec::new(),
        }
    }

    /// Merges `stack` into existing entries, appending any remainder at
    /// `pos`.
    pub fn add(&mut self, mut stack: ItemStack, pos: VoxelPos) {
        if stack.is_empty() {
            return;
        }
        for (existing, _) in &mut self.entries {
            if existing.is_mergeable_with(&stack) {
                existing.merge_from(&mut stack, self.cap);
                if stack.is_empty() {
                    return;
                }
            }
        }
        self.entries.push((stack, pos));
    }

    /// Number of stacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was dropped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stacks with the voxel each one started at.
    #[must_use]
    pub fn entries(&self) -> &[(ItemStack, VoxelPos)] {
        &self.entries
    }

    /// Sum of item counts over all stacks.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|(s, _)| u64::from(s.count)).sum()
    }

    fn into_entries(self) -> Vec<(ItemStack, VoxelPos)> {
        self.entries
    }
}

/// What a commit did to the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Voxels replaced by handlers (removals and toggles).
    pub voxels_changed: u32,
    /// Writes the world refused.
    pub rejected_mutations: u32,
    /// Item stacks spawned.
    pub stacks_emitted: u32,
    /// Items spawned over all stacks.
    pub items_emitted: u64,
    /// Fire blocks placed.
    pub fires_lit: u32,
}

/// Applies an explosion's voxel set to the world.
#[derive(Clone, Debug)]
pub struct DestructionCommitter {
    merge_cap: u32,
    ignition_chance: u32,
}

impl DestructionCommitter {
    /// Creates a committer from the configured merge cap and ignition odds.
    #[must_use]
    pub fn new(config: &ExplosionConfig) -> Self {
        Self {
            merge_cap: config.merge_cap.max(1),
            ignition_chance: config.ignition_chance.max(1),
        }
    }

    /// Converts `voxels`, writes the results and lights fires.
    ///
    /// Does nothing under [`BlockInteraction::Keep`]. Refused writes are
    /// counted and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ExplosionError::BlockHandler`] if a block handler fails.
    /// Drops collected before the failure are emitted first.
    pub fn commit<W>(
        &self,
        explosion: &Explosion,
        voxels: &AffectedVoxelSet,
        world: &mut W,
        rng: &mut dyn RngCore,
    ) -> ExplosionResult<CommitSummary>
    where
        W: VoxelAccess + WorldMutation + ?Sized,
    {
        let mut summary = CommitSummary::default();
        if explosion.interaction() == BlockInteraction::Keep {
            trace!("block interaction is keep, nothing to commit");
            return Ok(summary);
        }

        let mut order = voxels.to_vec();
        order.shuffle(rng);

        let mut drops = DropAccumulator::new(self.merge_cap);
        for &pos in &order {
            if let Err(source) = self.convert(explosion, pos, world, rng, &mut drops, &mut summary) {
                warn!(%pos, error = %source, "block handler failed");
                emit_drops(drops, world, &mut summary);
                return Err(ExplosionError::BlockHandler { pos, source });
            }
        }
        emit_drops(drops, world, &mut summary);

        if explosion.fire() {
            self.ignite(&order, world, rng, &mut summary);
        }

        debug!(
            voxels = order.len(),
            changed = summary.voxels_changed,
            rejected = summary.rejected_mutations,
            stacks = summary.stacks_emitted,
            fires = summary.fires_lit,
            "explosion committed"
        );
        Ok(summary)
    }

    fn convert<W>(
        &self,
        explosion: &Explosion,
        pos: VoxelPos,
        world: &mut W,
        rng: &mut dyn RngCore,
        drops: &mut DropAccumulator,
        summary: &mut CommitSummary,
    ) -> Result<(), BlockHandlerError>
    where
        W: VoxelAccess + WorldMutation + ?Sized,
    {
        let outcome = {
            let voxel = world.voxel(pos);
            let registry = world.registry();
            if registry.is_empty_voxel(&voxel) {
                return Ok(());
            }
            let block = registry.block(voxel.block.block);
            if block.air {
                // Only a fluid is left to clear.
                if !explosion.interaction().is_destructive() {
                    return Ok(());
                }
                HitResult::removed(Vec::new())
            } else {
                let hit = ExplosionHit {
                    pos,
                    state: voxel.block,
                    block,
                    interaction: explosion.interaction(),
                    radius: explosion.radius(),
                };
                block.handler.on_explosion_hit(&hit, rng)?
            }
        };

        if let Some(state) = outcome.replacement {
            if world.set_voxel(pos, state, SetFlags::DEFAULT) {
                summary.voxels_changed += 1;
            } else {
                summary.rejected_mutations += 1;
                trace!(%pos, "world rejected voxel write");
                return Ok(());
            }
        }
        for stack in outcome.drops {
            drops.add(stack, pos);
        }
        Ok(())
    }

    fn ignite<W>(&self, order: &[VoxelPos], world: &mut W, rng: &mut dyn RngCore, summary: &mut CommitSummary)
    where
        W: VoxelAccess + WorldMutation + ?Sized,
    {
        let Some(fire) = world.registry().fire_block() else {
            warn!("registry has no fire block, skipping ignition");
            return;
        };
        for &pos in order {
            if rng.gen_range(0..self.ignition_chance) != 0 {
                continue;
            }
            let voxel = world.voxel(pos);
            let below = world.voxel(pos.below());
            let registry = world.registry();
            let open = registry.block(voxel.block.block).air && voxel.fluid.is_empty();
            if !open || !registry.block(below.block.block).solid_render {
                continue;
            }
            if world.set_voxel(pos, BlockState::of(fire), SetFlags::DEFAULT) {
                summary.fires_lit += 1;
            } else {
                summary.rejected_mutations += 1;
                trace!(%pos, "world rejected fire placement");
            }
        }
    }
}

fn emit_drops<W: WorldMutation + ?Sized>(drops: DropAccumulator, world: &mut W, summary: &mut CommitSummary) {
    for (stack, pos) in drops.into_entries() {
        summary.stacks_emitted += 1;
        summary.items_emitted += u64::from(stack.count);
        world.emit_item_drop(stack, pos.center());
    }
}
