//! # Explosions & the Detonation State Machine
//!
//! An [`Explosion`] is the immutable description of one blast. An
//! [`ExplosionCoordinator`] runs it through two phases:
//!
//! ```text
//! Created ──detonate──► Detonated ──finalize──► Finalized
//!    │
//!    └──veto──► Cancelled
//! ```
//!
//! `detonate` traces the ray fan and resolves entity impacts (and applies
//! them); `finalize` plays effects and commits voxel changes. Between the two
//! the caller may inspect or prune the affected voxels.

use std::fmt;
use std::sync::Arc;

use blastwave_shared::{ParticleKind, SoundId, Vec3};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::commit::{CommitSummary, DestructionCommitter};
use crate::config::ExplosionConfig;
use crate::damage::DamageSource;
use crate::entity::{EntityId, IdentityKnockback, KnockbackModifier};
use crate::error::{ExplosionError, ExplosionResult};
use crate::impact::{EntityImpact, EntityImpactResolver, ImpactReport};
use crate::ray::{AffectedVoxelSet, RayTracer};
use crate::resistance::{ResistanceStrategy, ResistanceView};
use crate::world::ExplosionWorld;

/// How an explosion treats the voxels it reaches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockInteraction {
    /// Leave every voxel alone.
    Keep,
    /// Remove voxels, dropping everything.
    #[default]
    Destroy,
    /// Remove voxels; drops survive with probability `1 / radius`.
    DestroyWithDecay,
    /// Only trigger blocks that react (buttons, bells).
    TriggerOnly,
}

impl BlockInteraction {
    /// True for the modes that remove voxels.
    #[inline]
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::Destroy | Self::DestroyWithDecay)
    }
}

/// Particles and sound an explosion plays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionEffects {
    /// Particle for small or non-destructive blasts.
    pub small_particle: ParticleKind,
    /// Particle for large destructive blasts.
    pub large_particle: ParticleKind,
    /// Sound played at the centre.
    pub sound: SoundId,
}

impl Default for ExplosionEffects {
    fn default() -> Self {
        Self {
            small_particle: ParticleKind::Explosion,
            large_particle: ParticleKind::ExplosionEmitter,
            sound: SoundId::explode(),
        }
    }
}

/// Immutable parameters of one detonation.
#[derive(Clone)]
pub struct Explosion {
    center: Vec3,
    radius: f32,
    fire: bool,
    interaction: BlockInteraction,
    source: Option<EntityId>,
    damage_source: DamageSource,
    resistance: ResistanceStrategy,
    knockback: Arc<dyn KnockbackModifier>,
    effects: ExplosionEffects,
}

impl fmt::Debug for Explosion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explosion")
            .field("center", &self.center)
            .field("radius", &self.radius)
            .field("fire", &self.fire)
            .field("interaction", &self.interaction)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl Explosion {
    /// Starts building an explosion at `center` with `radius`.
    #[must_use]
    pub fn builder(center: Vec3, radius: f32) -> ExplosionBuilder {
        ExplosionBuilder::new(center, radius)
    }

    /// Centre of the blast.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Blast radius.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Whether the blast lights fires.
    #[must_use]
    pub fn fire(&self) -> bool {
        self.fire
    }

    /// Voxel interaction mode.
    #[must_use]
    pub fn interaction(&self) -> BlockInteraction {
        self.interaction
    }

    /// Entity that exploded, if any. Never affected by its own blast.
    #[must_use]
    pub fn source(&self) -> Option<EntityId> {
        self.source
    }

    /// Damage source handed to affected entities.
    #[must_use]
    pub fn damage_source(&self) -> &DamageSource {
        &self.damage_source
    }

    /// Resistance rules.
    #[must_use]
    pub fn resistance(&self) -> &ResistanceStrategy {
        &self.resistance
    }

    /// Knockback modifier.
    #[must_use]
    pub fn knockback(&self) -> &dyn KnockbackModifier {
        self.knockback.as_ref()
    }

    /// Presentation effects.
    #[must_use]
    pub fn effects(&self) -> &ExplosionEffects {
        &self.effects
    }
}

/// Builder for [`Explosion`].
pub struct ExplosionBuilder {
    center: Vec3,
    radius: f32,
    fire: bool,
    interaction: BlockInteraction,
    source: Option<EntityId>,
    damage_source: Option<DamageSource>,
    resistance: ResistanceStrategy,
    knockback: Arc<dyn KnockbackModifier>,
    effects: ExplosionEffects,
}

impl ExplosionBuilder {
    fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            fire: false,
            interaction: BlockInteraction::default(),
            source: None,
            damage_source: None,
            resistance: ResistanceStrategy::Default,
            knockback: Arc::new(IdentityKnockback),
            effects: ExplosionEffects::default(),
        }
    }

    /// Lights fires on the ground after the blast.
    #[must_use]
    pub fn fire(mut self, fire: bool) -> Self {
        self.fire = fire;
        self
    }

    /// Sets the voxel interaction mode.
    #[must_use]
    pub fn interaction(mut self, interaction: BlockInteraction) -> Self {
        self.interaction = interaction;
        self
    }

    /// Sets the entity that exploded.
    #[must_use]
    pub fn source(mut self, entity: EntityId) -> Self {
        self.source = Some(entity);
        self
    }

    /// Overrides the damage source.
    #[must_use]
    pub fn damage_source(mut self, source: DamageSource) -> Self {
        self.damage_source = Some(source);
        self
    }

    /// Sets the resistance strategy.
    #[must_use]
    pub fn resistance(mut self, strategy: ResistanceStrategy) -> Self {
        self.resistance = strategy;
        self
    }

    /// Sets the knockback modifier.
    #[must_use]
    pub fn knockback(mut self, modifier: Arc<dyn KnockbackModifier>) -> Self {
        self.knockback = modifier;
        self
    }

    /// Sets particles and sound.
    #[must_use]
    pub fn effects(mut self, effects: ExplosionEffects) -> Self {
        self.effects = effects;
        self
    }

    /// Validates and builds the explosion.
    ///
    /// # Errors
    ///
    /// Rejects a negative or non-finite radius and a non-finite centre.
    pub fn build(self) -> ExplosionResult<Explosion> {
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(ExplosionError::InvalidRadius(self.radius));
        }
        if !self.center.is_finite() {
            return Err(ExplosionError::InvalidOrigin(self.center));
        }
        let damage_source = self.damage_source.unwrap_or_else(|| {
            let source = DamageSource::explosion(self.center);
            match self.source {
                Some(entity) => source.with_direct(entity),
                None => source,
            }
        });
        Ok(Explosion {
            center: self.center,
            radius: self.radius,
            fire: self.fire,
            interaction: self.interaction,
            source: self.source,
            damage_source,
            resistance: self.resistance,
            knockback: self.knockback,
            effects: self.effects,
        })
    }
}

/// Lifecycle of a coordinated explosion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExplosionState {
    /// Built, not yet detonated.
    Created,
    /// Vetoed before detonation. Terminal.
    Cancelled,
    /// Effects computed, world not yet mutated.
    Detonated,
    /// World mutated. Terminal.
    Finalized,
}

/// Consulted right before detonation; returning true cancels it.
pub trait DetonationVeto {
    /// Whether to cancel `explosion`.
    fn veto(&self, explosion: &Explosion) -> bool;
}

impl<F> DetonationVeto for F
where
    F: Fn(&Explosion) -> bool,
{
    fn veto(&self, explosion: &Explosion) -> bool {
        self(explosion)
    }
}

/// Runs one explosion through detonate and finalize.
#[derive(Debug)]
pub struct ExplosionCoordinator {
    explosion: Explosion,
    state: ExplosionState,
    tracer: RayTracer,
    resolver: EntityImpactResolver,
    committer: DestructionCommitter,
    large_particle_min_radius: f32,
    sound_volume: f32,
    affected: AffectedVoxelSet,
    report: ImpactReport,
}

impl ExplosionCoordinator {
    /// Wraps `explosion` with engine parts built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ExplosionError::InvalidConfig`] if `config` fails
    /// [`ExplosionConfig::validate`].
    pub fn new(explosion: Explosion, config: &ExplosionConfig) -> ExplosionResult<Self> {
        config.validate()?;
        Ok(Self {
            explosion,
            state: ExplosionState::Created,
            tracer: RayTracer::new(config),
            resolver: EntityImpactResolver::new(config),
            committer: DestructionCommitter::new(config),
            large_particle_min_radius: config.large_particle_min_radius,
            sound_volume: config.sound_volume,
            affected: AffectedVoxelSet::new(),
            report: ImpactReport::default(),
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ExplosionState {
        self.state
    }

    /// The explosion's parameters.
    #[must_use]
    pub fn explosion(&self) -> &Explosion {
        &self.explosion
    }

    /// Blast radius.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.explosion.radius()
    }

    /// Blast centre.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.explosion.center()
    }

    /// Voxel interaction mode.
    #[must_use]
    pub fn interaction(&self) -> BlockInteraction {
        self.explosion.interaction()
    }

    /// Voxels the explosion will destroy.
    #[must_use]
    pub fn affected_voxels(&self) -> &AffectedVoxelSet {
        &self.affected
    }

    /// Drops every affected voxel so `finalize` changes no blocks.
    ///
    /// # Errors
    ///
    /// Only valid between detonate and finalize.
    pub fn clear_affected_voxels(&mut self) -> ExplosionResult<()> {
        self.require(ExplosionState::Detonated, "clear affected voxels of")?;
        self.affected.clear();
        Ok(())
    }

    /// Entity impacts from the last detonation.
    #[must_use]
    pub fn impacts(&self) -> impl Iterator<Item = &EntityImpact> + '_ {
        self.report.impacts.values()
    }

    /// Knockback to replay on player clients.
    #[must_use]
    pub fn player_knockback(&self) -> impl Iterator<Item = (EntityId, Vec3)> + '_ {
        self.report.player_knockback.iter().map(|(id, v)| (*id, *v))
    }

    /// The full impact report.
    #[must_use]
    pub fn report(&self) -> &ImpactReport {
        &self.report
    }

    /// Traces voxels and resolves and applies entity impacts.
    ///
    /// # Errors
    ///
    /// Returns [`ExplosionError::InvalidState`] unless the explosion is
    /// freshly created.
    pub fn detonate<W>(&mut self, world: &mut W, rng: &mut dyn RngCore) -> ExplosionResult<()>
    where
        W: ExplosionWorld + ?Sized,
    {
        self.require(ExplosionState::Created, "detonate")?;
        self.run_detonation(world, rng);
        Ok(())
    }

    /// Like [`detonate`](Self::detonate), but asks `veto` first.
    ///
    /// Returns `Ok(false)` and moves to [`ExplosionState::Cancelled`] if the
    /// veto fires; nothing is traced and the world is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ExplosionError::InvalidState`] unless the explosion is
    /// freshly created.
    pub fn detonate_with_veto<W, V>(&mut self, world: &mut W, rng: &mut dyn RngCore, veto: &V) -> ExplosionResult<bool>
    where
        W: ExplosionWorld + ?Sized,
        V: DetonationVeto + ?Sized,
    {
        self.require(ExplosionState::Created, "detonate")?;
        if veto.veto(&self.explosion) {
            info!(center = %self.explosion.center(), radius = self.explosion.radius(), "explosion vetoed");
            self.state = ExplosionState::Cancelled;
            return Ok(false);
        }
        self.run_detonation(world, rng);
        Ok(true)
    }

    fn run_detonation<W>(&mut self, world: &mut W, rng: &mut dyn RngCore)
    where
        W: ExplosionWorld + ?Sized,
    {
        let explosion = &self.explosion;
        let view = ResistanceView::new(&*world, explosion.resistance());
        self.affected = self.tracer.trace(explosion, &*world, &view, rng);

        if explosion.radius() > 0.0 {
            let area = self.resolver.search_box(explosion);
            let candidates = world.entities_in_box(&area);
            self.report = self.resolver.resolve(explosion, &candidates, &*world);
            for impact in self.report.impacts.values() {
                if !world.apply_impact(impact.entity, explosion.damage_source(), impact.damage, impact.impulse) {
                    debug!(entity = %impact.entity, "impact target vanished");
                }
            }
        }

        debug!(
            voxels = self.affected.len(),
            entities = self.report.len(),
            "explosion detonated"
        );
        self.state = ExplosionState::Detonated;
    }

    /// Plays effects and commits voxel changes.
    ///
    /// `spawn_particles` only controls particles; the world ends up the same
    /// either way. The explosion is finalized even if the commit fails.
    ///
    /// # Errors
    ///
    /// Returns [`ExplosionError::InvalidState`] unless detonated, or the
    /// commit's block handler error.
    pub fn finalize<W>(&mut self, world: &mut W, rng: &mut dyn RngCore, spawn_particles: bool) -> ExplosionResult<CommitSummary>
    where
        W: ExplosionWorld + ?Sized,
    {
        self.require(ExplosionState::Detonated, "finalize")?;
        let explosion = &self.explosion;
        let center = explosion.center();
        let effects = explosion.effects();

        let pitch = (1.0 + (rng.gen::<f32>() - rng.gen::<f32>()) * 0.2) * 0.7;
        world.play_effect(&effects.sound, center, self.sound_volume, pitch);

        if spawn_particles {
            let large = explosion.radius() >= self.large_particle_min_radius
                && explosion.interaction().is_destructive();
            let kind = if large {
                effects.large_particle
            } else {
                effects.small_particle
            };
            world.spawn_particle(kind, center, Vec3::new(1.0, 0.0, 0.0));
        }

        let result = self.committer.commit(explosion, &self.affected, world, rng);
        self.state = ExplosionState::Finalized;
        result
    }

    fn require(&self, expected: ExplosionState, operation: &'static str) -> ExplosionResult<()> {
        if self.state == expected {
            return Ok(());
        }
        warn!(operation, state = ?self.state, "invalid explosion state transition");
        Err(ExplosionError::InvalidState {
            operation,
            state: self.state,
        })
    }
}
