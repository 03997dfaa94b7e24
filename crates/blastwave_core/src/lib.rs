//! # BLASTWAVE Core
//!
//! Explosion propagation and effect resolution for voxel worlds.
//!
//! ## Phases
//!
//! 1. **Detonate** - cast the ray fan against voxel resistance, collect the
//!    voxels to destroy, then damage and push every exposed entity.
//! 2. **Finalize** - play effects, convert voxels to drops through their
//!    block handlers, merge drops, write the world, light fires.
//!
//! Nothing touches the world's voxels between the phases, so callers may
//! inspect or prune the affected set before committing it.
//!
//! ## Determinism
//!
//! Every random draw comes from the generator passed in. The same world,
//! explosion and seed always produce the same result.
//!
//! ## Example
//!
//! ```rust,ignore
//! use blastwave_core::{seeded_rng, Explosion, ExplosionConfig, ExplosionCoordinator};
//!
//! let config = ExplosionConfig::default();
//! let explosion = Explosion::builder(center, 4.0).fire(true).build()?;
//! let mut coordinator = ExplosionCoordinator::new(explosion, &config)?;
//! let mut rng = seeded_rng(42);
//!
//! coordinator.detonate(&mut world, &mut rng)?;
//! let summary = coordinator.finalize(&mut world, &mut rng, true)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod block;
pub mod commit;
pub mod config;
pub mod damage;
pub mod entity;
pub mod error;
pub mod explosion;
pub mod exposure;
pub mod handler;
pub mod impact;
pub mod item;
pub mod ray;
pub mod resistance;
pub mod world;

#[cfg(test)]
mod test_support;

pub use block::{BlockId, BlockRegistry, BlockState, BlockType, FluidId, FluidState, FluidType, Voxel};
pub use commit::{CommitSummary, DestructionCommitter, DropAccumulator};
pub use config::ExplosionConfig;
pub use damage::{DamageKind, DamageSource};
pub use entity::{
    BlastProtectionDampener, EntityCategory, EntityId, EntitySnapshot, IdentityKnockback, KnockbackModifier,
    PlayerAbilities,
};
pub use error::{BlockHandlerError, ExplosionError, ExplosionResult};
pub use explosion::{
    BlockInteraction, DetonationVeto, Explosion, ExplosionBuilder, ExplosionCoordinator, ExplosionEffects,
    ExplosionState,
};
pub use exposure::{ExposureCalculator, MAX_AXIS_STEPS};
pub use handler::{DropSelf, ExplosionHit, ExplosionHitHandler, HandlerKind, HitResult, NoDrops, Trigger};
pub use impact::{EntityImpact, EntityImpactResolver, ImpactReport};
pub use item::{ItemId, ItemStack};
pub use ray::{AffectedVoxelSet, RayStep, RayTracer};
pub use resistance::{
    EntityResistance, EntityResistanceRules, ProtectedBlocks, ResistanceCap, ResistanceStrategy, ResistanceView,
    VoxelResistanceSource,
};
pub use world::{CollisionQuery, EffectSink, EntityAccess, ExplosionWorld, SetFlags, VoxelAccess, WorldMutation};

use rand::SeedableRng;

/// Generator used for reproducible explosions.
pub type ExplosionRng = rand_chacha::ChaCha8Rng;

/// Creates a seeded generator for tests and replays.
#[must_use]
pub fn seeded_rng(seed: u64) -> ExplosionRng {
    ExplosionRng::seed_from_u64(seed)
}
