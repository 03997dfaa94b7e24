//! # Memory World
//!
//! A complete in-memory host for explosions: chunked voxels, an entity
//! table, dropped items and a log of played effects. Presentation and voxel
//! changes are also forwarded to an [`EventSender`] when one is attached.

use std::collections::{BTreeMap, HashMap, HashSet};

use blastwave_core::{
    BlockRegistry, BlockState, CollisionQuery, DamageSource, EffectSink, EntityAccess, EntityCategory, EntityId,
    EntitySnapshot, ItemStack, SetFlags, Voxel, VoxelAccess, WorldMutation,
};
use blastwave_shared::{Aabb, EventSender, ExplosionEvent, ParticleKind, SoundId, Vec3, VoxelPos};
use tracing::trace;

use crate::chunk::{Chunk, ChunkCoord};
use crate::collision;

/// Default lowest buildable Y.
pub const DEFAULT_MIN_Y: i32 = -64;

/// Default build height (exclusive upper bound is `min_y + height`).
pub const DEFAULT_HEIGHT: usize = 384;

/// An entity living in a [`MemoryWorld`].
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    /// Identity.
    pub id: EntityId,
    /// Category.
    pub category: EntityCategory,
    /// Feet position.
    pub position: Vec3,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
    /// Current velocity.
    pub velocity: Vec3,
    /// Remaining health.
    pub health: f32,
    /// Never affected by explosions.
    pub explosion_immune: bool,
    /// Every hit taken, oldest first.
    pub damage_log: Vec<(DamageSource, f32)>,
}

impl EntityRecord {
    /// Read-only view handed to the explosion engine.
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        let mut snapshot = EntitySnapshot::new(self.id, self.position, self.width, self.height, self.category);
        snapshot.explosion_immune = self.explosion_immune;
        snapshot.ignores_explosions = matches!(
            self.category,
            EntityCategory::Player { abilities, .. } if abilities.spectator
        );
        snapshot
    }

    /// Collision box in world space.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_feet(self.position, self.width, self.height)
    }
}

/// An item stack lying in the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DroppedItem {
    /// The stack.
    pub stack: ItemStack,
    /// Where it was spawned.
    pub position: Vec3,
}

/// A sound or particle the world was asked to present.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectRecord {
    /// A positioned sound.
    Sound {
        /// Sound id.
        sound: SoundId,
        /// Where it plays.
        position: Vec3,
        /// Volume.
        volume: f32,
        /// Pitch.
        pitch: f32,
    },
    /// A particle.
    Particle {
        /// Particle kind.
        kind: ParticleKind,
        /// Spawn position.
        position: Vec3,
        /// Initial velocity.
        velocity: Vec3,
    },
}

/// Chunked voxel world with entities.
#[derive(Debug)]
pub struct MemoryWorld {
    registry: BlockRegistry,
    chunks: HashMap<ChunkCoord, Chunk>,
    min_y: i32,
    height: usize,
    entities: BTreeMap<EntityId, EntityRecord>,
    next_entity: u64,
    protected: HashSet<VoxelPos>,
    drops: Vec<DroppedItem>,
    effects: Vec<EffectRecord>,
    events: Option<EventSender>,
}

impl MemoryWorld {
    /// Creates an empty world with the default build height.
    #[must_use]
    pub fn new(registry: BlockRegistry) -> Self {
        Self::with_build_height(registry, DEFAULT_MIN_Y, DEFAULT_HEIGHT)
    }

    /// Creates an empty world spanning `min_y .. min_y + height`.
    #[must_use]
    pub fn with_build_height(registry: BlockRegistry, min_y: i32, height: usize) -> Self {
        Self {
            registry,
            chunks: HashMap::new(),
            min_y,
            height,
            entities: BTreeMap::new(),
            next_entity: 1,
            protected: HashSet::new(),
            drops: Vec::new(),
            effects: Vec::new(),
            events: None,
        }
    }

    /// Forwards presentation and voxel changes to `sender`.
    pub fn attach_events(&mut self, sender: EventSender) {
        self.events = Some(sender);
    }

    /// Lowest buildable Y.
    #[must_use]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    /// One past the highest buildable Y.
    #[must_use]
    pub fn max_y(&self) -> i32 {
        self.min_y + self.height as i32
    }

    /// Number of chunks holding data.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Writes a voxel without notifications. Returns false outside the build
    /// height.
    pub fn place_voxel(&mut self, pos: VoxelPos, voxel: Voxel) -> bool {
        if self.is_outside_build_height(pos) {
            return false;
        }
        let coord = ChunkCoord::containing(pos);
        let (min_y, height) = (self.min_y, self.height);
        self.chunks
            .entry(coord)
            .or_insert_with(|| Chunk::new(coord, min_y, height))
            .set(pos, voxel)
    }

    /// Writes a block without notifications.
    pub fn place(&mut self, pos: VoxelPos, state: BlockState) -> bool {
        self.place_voxel(pos, Voxel::block(state))
    }

    /// Fills the box between two corners (inclusive) with `state`.
    pub fn fill(&mut self, a: VoxelPos, b: VoxelPos, state: BlockState) {
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for z in a.z.min(b.z)..=a.z.max(b.z) {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    self.place(VoxelPos::new(x, y, z), state);
                }
            }
        }
    }

    /// Block state at `pos`.
    #[must_use]
    pub fn block_at(&self, pos: VoxelPos) -> BlockState {
        self.voxel(pos).block
    }

    /// Makes `pos` refuse every write.
    pub fn protect(&mut self, pos: VoxelPos) {
        self.protected.insert(pos);
    }

    /// Adds an entity and returns its id.
    pub fn spawn(&mut self, category: EntityCategory, position: Vec3, width: f64, height: f64) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        self.entities.insert(
            id,
            EntityRecord {
                id,
                category,
                position,
                width,
                height,
                velocity: Vec3::ZERO,
                health: 20.0,
                explosion_immune: false,
                damage_log: Vec::new(),
            },
        );
        id
    }

    /// Entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    /// Mutable entity by id.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.entities.get_mut(&id)
    }

    /// Removes an entity.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityRecord> {
        self.entities.remove(&id)
    }

    /// All entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityRecord> + '_ {
        self.entities.values()
    }

    /// Items dropped so far.
    #[must_use]
    pub fn drops(&self) -> &[DroppedItem] {
        &self.drops
    }

    /// Effects played so far.
    #[must_use]
    pub fn effects(&self) -> &[EffectRecord] {
        &self.effects
    }

    fn publish(&self, event: ExplosionEvent) {
        if let Some(sender) = &self.events {
            if !sender.send(event) {
                trace!("event bus full, dropping event");
            }
        }
    }
}

impl VoxelAccess for MemoryWorld {
    fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    fn voxel(&self, pos: VoxelPos) -> Voxel {
        self.chunks
            .get(&ChunkCoord::containing(pos))
            .map_or(Voxel::AIR, |chunk| chunk.get(pos))
    }

    fn is_outside_build_height(&self, pos: VoxelPos) -> bool {
        pos.y < self.min_y || pos.y >= self.max_y()
    }
}

impl CollisionQuery for MemoryWorld {
    fn collides(&self, from: Vec3, to: Vec3) -> bool {
        collision::segment_blocked(from, to, |pos| {
            self.registry.block(self.voxel(pos).block.block).collision
        })
    }
}

impl WorldMutation for MemoryWorld {
    fn set_voxel(&mut self, pos: VoxelPos, state: BlockState, flags: SetFlags) -> bool {
        if self.protected.contains(&pos) || !self.place(pos, state) {
            return false;
        }
        if flags.has(SetFlags::SYNC_CLIENTS) {
            self.publish(ExplosionEvent::VoxelChanged {
                pos,
                block: state.block.0,
            });
        }
        true
    }

    fn emit_item_drop(&mut self, stack: ItemStack, position: Vec3) {
        self.drops.push(DroppedItem { stack, position });
    }
}

impl EntityAccess for MemoryWorld {
    fn entities_in_box(&self, area: &Aabb) -> Vec<EntitySnapshot> {
        self.entities
            .values()
            .filter(|e| e.bounds().intersects(area))
            .map(EntityRecord::snapshot)
            .collect()
    }

    fn apply_impact(&mut self, entity: EntityId, source: &DamageSource, damage: f32, impulse: Vec3) -> bool {
        let Some(record) = self.entities.get_mut(&entity) else {
            return false;
        };
        record.health -= damage;
        record.velocity += impulse;
        record.damage_log.push((source.clone(), damage));
        true
    }
}

impl EffectSink for MemoryWorld {
    fn play_effect(&mut self, sound: &SoundId, position: Vec3, volume: f32, pitch: f32) {
        self.effects.push(EffectRecord::Sound {
            sound: sound.clone(),
            position,
            volume,
            pitch,
        });
        self.publish(ExplosionEvent::Sound {
            sound: sound.clone(),
            position,
            volume,
            pitch,
        });
    }

    fn spawn_particle(&mut self, kind: ParticleKind, position: Vec3, velocity: Vec3) {
        self.effects.push(EffectRecord::Particle {
            kind,
            position,
            velocity,
        });
        self.publish(ExplosionEvent::Particle {
            kind,
            position,
            velocity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blastwave_core::PlayerAbilities;
    use blastwave_shared::EventBus;

    fn world() -> MemoryWorld {
        MemoryWorld::new(BlockRegistry::with_defaults())
    }

    #[test]
    fn test_build_height_limits() {
        let mut world = MemoryWorld::with_build_height(BlockRegistry::with_defaults(), 0, 16);
        let stone = BlockState::of(world.registry().by_name("stone").unwrap());
        assert!(world.place(VoxelPos::new(0, 15, 0), stone));
        assert!(!world.place(VoxelPos::new(0, 16, 0), stone));
        assert!(!world.place(VoxelPos::new(0, -1, 0), stone));
        assert!(world.is_outside_build_height(VoxelPos::new(0, 16, 0)));
    }

    #[test]
    fn test_protected_voxels_refuse_writes() {
        let mut world = world();
        world.protect(VoxelPos::new(1, 1, 1));
        assert!(!world.set_voxel(VoxelPos::new(1, 1, 1), BlockState::AIR, SetFlags::DEFAULT));
        assert!(world.set_voxel(VoxelPos::new(1, 2, 1), BlockState::AIR, SetFlags::DEFAULT));
    }

    #[test]
    fn test_collision_respects_non_solid_blocks() {
        let mut world = world();
        let glass = BlockState::of(world.registry().by_name("glass").unwrap());
        let fire = BlockState::of(world.registry().by_name("fire").unwrap());
        world.place(VoxelPos::new(2, 0, 0), glass);
        world.place(VoxelPos::new(2, 0, 2), fire);
        assert!(world.collides(Vec3::new(0.5, 0.5, 0.5), Vec3::new(4.5, 0.5, 0.5)));
        assert!(!world.collides(Vec3::new(0.5, 0.5, 2.5), Vec3::new(4.5, 0.5, 2.5)));
    }

    #[test]
    fn test_spectators_ignore_explosions() {
        let mut world = world();
        let id = world.spawn(
            EntityCategory::Player {
                abilities: PlayerAbilities {
                    spectator: true,
                    ..PlayerAbilities::default()
                },
                blast_protection: 0,
            },
            Vec3::ZERO,
            0.6,
            1.8,
        );
        let found = world.entities_in_box(&Aabb::new(Vec3::splat(-2.0), Vec3::splat(2.0)));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert!(found[0].ignores_explosions);
    }

    #[test]
    fn test_apply_impact_updates_entity() {
        let mut world = world();
        let id = world.spawn(EntityCategory::Physics, Vec3::ZERO, 0.25, 0.25);
        let source = DamageSource::explosion(Vec3::ZERO);
        assert!(world.apply_impact(id, &source, 5.0, Vec3::new(0.0, 1.0, 0.0)));
        let record = world.entity(id).unwrap();
        assert_eq!(record.health, 15.0);
        assert_eq!(record.velocity, Vec3::new(0.0, 1.0, 0.0));
        assert!(!world.apply_impact(EntityId(999), &source, 5.0, Vec3::ZERO));
    }

    #[test]
    fn test_events_are_forwarded() {
        let mut world = world();
        let bus = EventBus::new(16);
        world.attach_events(bus.sender());
        world.set_voxel(VoxelPos::new(0, 0, 0), BlockState::AIR, SetFlags::DEFAULT);
        world.set_voxel(VoxelPos::new(0, 1, 0), BlockState::AIR, SetFlags::NONE);
        world.play_effect(&SoundId::explode(), Vec3::ZERO, 4.0, 1.0);
        let events = bus.receiver().drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ExplosionEvent::VoxelChanged { .. }));
        assert!(matches!(events[1], ExplosionEvent::Sound { .. }));
    }
}
