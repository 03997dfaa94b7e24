//! In-module fake world for unit tests.

use std::collections::HashMap;

use blastwave_shared::{Aabb, ParticleKind, SoundId, Vec3, VoxelPos};

use crate::block::{BlockRegistry, BlockState, Voxel};
use crate::damage::DamageSource;
use crate::entity::{EntityId, EntitySnapshot};
use crate::item::ItemStack;
use crate::world::{CollisionQuery, EffectSink, EntityAccess, SetFlags, VoxelAccess, WorldMutation};

/// A hash-map world that records every side effect.
#[derive(Debug)]
pub struct FakeWorld {
    pub registry: BlockRegistry,
    pub voxels: HashMap<VoxelPos, Voxel>,
    pub min_y: i32,
    pub max_y: i32,
    pub entities: Vec<EntitySnapshot>,
    pub impacts: Vec<(EntityId, DamageSource, f32, Vec3)>,
    pub writes: Vec<(VoxelPos, BlockState)>,
    pub drops: Vec<(ItemStack, Vec3)>,
    pub sounds: Vec<(SoundId, Vec3, f32, f32)>,
    pub particles: Vec<(ParticleKind, Vec3, Vec3)>,
    pub reject_writes: bool,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self {
            registry: BlockRegistry::with_defaults(),
            voxels: HashMap::new(),
            min_y: -64,
            max_y: 320,
            entities: Vec::new(),
            impacts: Vec::new(),
            writes: Vec::new(),
            drops: Vec::new(),
            sounds: Vec::new(),
            particles: Vec::new(),
            reject_writes: false,
        }
    }

    pub fn put_voxel(&mut self, pos: VoxelPos, voxel: Voxel) {
        self.voxels.insert(pos, voxel);
    }

    pub fn put_block(&mut self, pos: VoxelPos, state: BlockState) {
        self.put_voxel(pos, Voxel::block(state));
    }

    pub fn fill(&mut self, min: VoxelPos, max: VoxelPos, name: &str) {
        let state = BlockState::of(self.registry.require(name).unwrap());
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.put_block(VoxelPos::new(x, y, z), state);
                }
            }
        }
    }

    pub fn block_at(&self, pos: VoxelPos) -> BlockState {
        self.voxel(pos).block
    }
}

impl VoxelAccess for FakeWorld {
    fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    fn voxel(&self, pos: VoxelPos) -> Voxel {
        self.voxels.get(&pos).copied().unwrap_or(Voxel::AIR)
    }

    fn is_outside_build_height(&self, pos: VoxelPos) -> bool {
        pos.y < self.min_y || pos.y >= self.max_y
    }
}

impl CollisionQuery for FakeWorld {
    fn collides(&self, from: Vec3, to: Vec3) -> bool {
        let steps = ((to - from).length() / 0.05).ceil().max(1.0) as u32;
        (0..=steps).any(|i| {
            let pos = VoxelPos::containing(from.lerp(to, f64::from(i) / f64::from(steps)));
            self.registry.block(self.voxel(pos).block.block).collision
        })
    }
}

impl WorldMutation for FakeWorld {
    fn set_voxel(&mut self, pos: VoxelPos, state: BlockState, _flags: SetFlags) -> bool {
        if self.reject_writes || self.is_outside_build_height(pos) {
            return false;
        }
        self.voxels.insert(pos, Voxel::block(state));
        self.writes.push((pos, state));
        true
    }

    fn emit_item_drop(&mut self, stack: ItemStack, position: Vec3) {
        self.drops.push((stack, position));
    }
}

impl EntityAccess for FakeWorld {
    fn entities_in_box(&self, area: &Aabb) -> Vec<EntitySnapshot> {
        self.entities
            .iter()
            .filter(|e| e.bounds.intersects(area))
            .cloned()
            .collect()
    }

    fn apply_impact(&mut self, entity: EntityId, source: &DamageSource, damage: f32, impulse: Vec3) -> bool {
        self.impacts.push((entity, source.clone(), damage, impulse));
        self.entities.iter().any(|e| e.id == entity)
    }
}

impl EffectSink for FakeWorld {
    fn play_effect(&mut self, sound: &SoundId, position: Vec3, volume: f32, pitch: f32) {
        self.sounds.push((sound.clone(), position, volume, pitch));
    }

    fn spawn_particle(&mut self, kind: ParticleKind, position: Vec3, velocity: Vec3) {
        self.particles.push((kind, position, velocity));
    }
}
