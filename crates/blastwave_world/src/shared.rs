//! Lock-guarded world handle.
//!
//! Both explosion phases run under one write lock, so no other system
//! observes the world between detonation and commit.

use std::sync::Arc;

use blastwave_core::{CommitSummary, Explosion, ExplosionConfig, ExplosionCoordinator, ExplosionResult};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rand::RngCore;
use tracing::debug;

use crate::world::MemoryWorld;

/// Cloneable handle to a [`MemoryWorld`].
#[derive(Clone, Debug)]
pub struct SharedWorld {
    inner: Arc<RwLock<MemoryWorld>>,
}

impl SharedWorld {
    /// Wraps a world.
    #[must_use]
    pub fn new(world: MemoryWorld) -> Self {
        Self {
            inner: Arc::new(RwLock::new(world)),
        }
    }

    /// Read access.
    pub fn read(&self) -> RwLockReadGuard<'_, MemoryWorld> {
        self.inner.read()
    }

    /// Write access.
    pub fn write(&self) -> RwLockWriteGuard<'_, MemoryWorld> {
        self.inner.write()
    }

    /// Detonates and finalizes `explosion` while holding the write lock.
    ///
    /// Returns the finished coordinator (for its impact report) together
    /// with the commit summary.
    ///
    /// # Errors
    ///
    /// Propagates configuration, detonation and commit errors.
    pub fn detonate_and_finalize(
        &self,
        explosion: Explosion,
        config: &ExplosionConfig,
        rng: &mut dyn RngCore,
        spawn_particles: bool,
    ) -> ExplosionResult<(ExplosionCoordinator, CommitSummary)> {
        let mut coordinator = ExplosionCoordinator::new(explosion, config)?;
        let mut world = self.inner.write();
        coordinator.detonate(&mut *world, rng)?;
        let summary = coordinator.finalize(&mut *world, rng, spawn_particles)?;
        drop(world);
        debug!(changed = summary.voxels_changed, "shared explosion committed");
        Ok((coordinator, summary))
    }
}
