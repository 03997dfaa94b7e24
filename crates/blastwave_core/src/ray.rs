//! # Ray Fan Tracing
//!
//! Casts one ray through every cell on the outer shell of a logical cube
//! centred on the explosion. Each ray starts with a jittered share of the
//! radius as power and pays for every voxel it crosses:
//!
//! ```text
//! power = radius * (0.7 + rand * 0.6)
//! loop while power > 0:
//!     power -= (resistance + 0.3) * 0.3     if the voxel is not empty
//!     record voxel                          if power > 0 and destructible
//!     advance 0.3 along the ray
//!     power -= 0.225
//! ```
//!
//! Tracing only reads the world; a voxel "destroyed" by one ray still
//! resists every other ray of the same explosion.

use std::collections::BTreeSet;

use blastwave_shared::{Vec3, VoxelPos};
use rand::{Rng, RngCore};
use tracing::debug;

use crate::config::ExplosionConfig;
use crate::explosion::Explosion;
use crate::resistance::VoxelResistanceSource;
use crate::world::VoxelAccess;

/// Voxels an explosion will destroy, without duplicates.
///
/// Ordered so that the commit shuffle depends only on the generator seed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AffectedVoxelSet {
    voxels: BTreeSet<VoxelPos>,
}

impl AffectedVoxelSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a voxel. Returns false if it was already present.
    pub fn insert(&mut self, pos: VoxelPos) -> bool {
        self.voxels.insert(pos)
    }

    /// True if `pos` is in the set.
    #[must_use]
    pub fn contains(&self, pos: VoxelPos) -> bool {
        self.voxels.contains(&pos)
    }

    /// Number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// True if nothing will be destroyed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Iterates in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = VoxelPos> + '_ {
        self.voxels.iter().copied()
    }

    /// Removes every voxel.
    pub fn clear(&mut self) {
        self.voxels.clear();
    }

    /// Copies the voxels into a vector, in coordinate order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<VoxelPos> {
        self.iter().collect()
    }
}

impl FromIterator<VoxelPos> for AffectedVoxelSet {
    fn from_iter<I: IntoIterator<Item = VoxelPos>>(iter: I) -> Self {
        Self {
            voxels: iter.into_iter().collect(),
        }
    }
}

/// One step of a marching ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayStep {
    /// Voxel the step landed in.
    pub pos: VoxelPos,
    /// Power before paying for this voxel.
    pub power_before: f32,
    /// Power after paying for this voxel (before attenuation).
    pub power_after: f32,
    /// Whether the voxel was recorded as destroyed.
    pub destroyed: bool,
}

/// Casts the ray fan of an explosion.
#[derive(Clone, Debug)]
pub struct RayTracer {
    directions: Vec<Vec3>,
    step: f64,
    jitter_min: f32,
    jitter_span: f32,
    resistance_bias: f32,
    attenuation: f32,
}

impl RayTracer {
    /// Precomputes the ray directions for `config.ray_grid`.
    #[must_use]
    pub fn new(config: &ExplosionConfig) -> Self {
        Self {
            directions: shell_directions(config.ray_grid),
            step: config.ray_step,
            jitter_min: config.power_jitter_min,
            jitter_span: config.power_jitter_span,
            resistance_bias: config.resistance_bias,
            attenuation: config.step_attenuation,
        }
    }

    /// Number of rays per explosion.
    #[must_use]
    pub fn ray_count(&self) -> usize {
        self.directions.len()
    }

    /// Unit ray directions, in cube-index order.
    #[must_use]
    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    /// Marches a single ray from `origin` along unit `direction` with
    /// `power`, reporting each step to `visit`. The same voxel may be
    /// reported by consecutive steps.
    pub fn march<W, S>(
        &self,
        origin: Vec3,
        direction: Vec3,
        mut power: f32,
        world: &W,
        source: &S,
        mut visit: impl FnMut(RayStep),
    ) where
        W: VoxelAccess + ?Sized,
        S: VoxelResistanceSource + ?Sized,
    {
        let advance = direction * self.step;
        let mut point = origin;
        while power > 0.0 {
            let pos = VoxelPos::containing(point);
            if world.is_outside_build_height(pos) {
                break;
            }
            let power_before = power;
            if let Some(resistance) = source.resistance_at(pos) {
                power -= (resistance + self.resistance_bias) * self.step as f32;
            }
            let destroyed = power > 0.0 && source.should_destroy(power, pos);
            visit(RayStep {
                pos,
                power_before,
                power_after: power,
                destroyed,
            });
            point += advance;
            power -= self.attenuation;
        }
    }

    /// Traces the full ray fan of `explosion`.
    ///
    /// A zero radius traces nothing and consumes no randomness.
    pub fn trace<W, S>(&self, explosion: &Explosion, world: &W, source: &S, rng: &mut dyn RngCore) -> AffectedVoxelSet
    where
        W: VoxelAccess + ?Sized,
        S: VoxelResistanceSource + ?Sized,
    {
        let mut affected = AffectedVoxelSet::new();
        let radius = explosion.radius();
        if radius <= 0.0 {
            return affected;
        }
        let origin = explosion.center();
        for &direction in &self.directions {
            let power = radius * (self.jitter_min + rng.gen::<f32>() * self.jitter_span);
            self.march(origin, direction, power, world, source, |step| {
                if step.destroyed {
                    affected.insert(step.pos);
                }
            });
        }
        debug!(
            center = %origin,
            radius,
            rays = self.directions.len(),
            voxels = affected.len(),
            "ray fan traced"
        );
        affected
    }
}

/// Unit directions through every cell on the shell of a `grid`-sided cube.
fn shell_directions(grid: u32) -> Vec<Vec3> {
    let last = grid.saturating_sub(1);
    if last == 0 {
        return Vec::new();
    }
    let scale = f64::from(last);
    let mut directions = Vec::new();
    for x in 0..grid {
        for y in 0..grid {
            for z in 0..grid {
                let on_shell = x == 0 || x == last || y == 0 || y == last || z == 0 || z == last;
                if !on_shell {
                    continue;
                }
                let offset = Vec3::new(
                    f64::from(x) / scale * 2.0 - 1.0,
                    f64::from(y) / scale * 2.0 - 1.0,
                    f64::from(z) / scale * 2.0 - 1.0,
                );
                directions.push(offset.normalize_or_zero());
            }
        }
    }
    directions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockState;
    use crate::explosion::Explosion;
    use crate::resistance::{ResistanceStrategy, ResistanceView};
    use crate::seeded_rng;
    use crate::test_support::FakeWorld;
    use blastwave_shared::constants;

    fn trace(world: &FakeWorld, explosion: &Explosion, seed: u64) -> AffectedVoxelSet {
        let tracer = RayTracer::new(&ExplosionConfig::default());
        let strategy = ResistanceStrategy::Default;
        let view = ResistanceView::new(world, &strategy);
        tracer.trace(explosion, world, &view, &mut seeded_rng(seed))
    }

    #[test]
    fn test_shell_ray_count() {
        let tracer = RayTracer::new(&ExplosionConfig::default());
        assert_eq!(tracer.ray_count(), constants::RAY_COUNT);
        for d in tracer.directions() {
            assert!((d.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_all_air_is_empty() {
        let world = FakeWorld::new();
        let explosion = Explosion::builder(Vec3::ZERO, 4.0).build().unwrap();
        assert!(trace(&world, &explosion, 1).is_empty());
    }

    #[test]
    fn test_floor_below_origin_destroyed() {
        let mut world = FakeWorld::new();
        world.fill(VoxelPos::new(-8, -1, -8), VoxelPos::new(8, -1, 8), "dirt");
        let explosion = Explosion::builder(Vec3::ZERO, 4.0).build().unwrap();
        let affected = trace(&world, &explosion, 42);
        assert!(affected.contains(VoxelPos::new(0, -1, 0)));
        assert!(affected.iter().all(|p| p.y == -1));
    }

    #[test]
    fn test_zero_radius_traces_nothing() {
        let mut world = FakeWorld::new();
        world.fill(VoxelPos::new(-2, -2, -2), VoxelPos::new(2, 2, 2), "dirt");
        let explosion = Explosion::builder(Vec3::new(0.5, 0.5, 0.5), 0.0).build().unwrap();
        assert!(trace(&world, &explosion, 1).is_empty());
    }

    #[test]
    fn test_same_seed_same_set() {
        let mut world = FakeWorld::new();
        world.fill(VoxelPos::new(-5, -5, -5), VoxelPos::new(5, 5, 5), "sand");
        let explosion = Explosion::builder(Vec3::new(0.5, 0.5, 0.5), 3.0).build().unwrap();
        assert_eq!(trace(&world, &explosion, 9), trace(&world, &explosion, 9));
    }

    #[test]
    fn test_power_never_increases() {
        let mut world = FakeWorld::new();
        world.fill(VoxelPos::new(-6, -6, -6), VoxelPos::new(6, 6, 6), "dirt");
        let stone = world.registry.require("stone").unwrap();
        world.put_block(VoxelPos::new(2, 0, 0), BlockState::of(stone));
        let tracer = RayTracer::new(&ExplosionConfig::default());
        let strategy = ResistanceStrategy::Default;
        let view = ResistanceView::new(&world, &strategy);
        for &direction in tracer.directions() {
            let mut last = f32::INFINITY;
            tracer.march(Vec3::new(0.5, 0.5, 0.5), direction, 5.0, &world, &view, |step| {
                assert!(step.power_after <= step.power_before);
                assert!(step.power_before <= last);
                last = step.power_after;
            });
        }
    }

    #[test]
    fn test_bedrock_stops_ray() {
        let mut world = FakeWorld::new();
        let bedrock = world.registry.require("bedrock").unwrap();
        world.put_block(VoxelPos::new(1, 0, 0), BlockState::of(bedrock));
        let tracer = RayTracer::new(&ExplosionConfig::default());
        let strategy = ResistanceStrategy::Default;
        let view = ResistanceView::new(&world, &strategy);
        let mut visited = Vec::new();
        tracer.march(Vec3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0), 8.0, &world, &view, |step| {
            visited.push(step);
        });
        let last = visited.last().unwrap();
        assert_eq!(last.pos, VoxelPos::new(1, 0, 0));
        assert!(!last.destroyed);
    }

    #[test]
    fn test_ray_stops_at_build_height() {
        let mut world = FakeWorld::new();
        world.max_y = 2;
        let tracer = RayTracer::new(&ExplosionConfig::default());
        let strategy = ResistanceStrategy::Default;
        let view = ResistanceView::new(&world, &strategy);
        let mut highest = i32::MIN;
        tracer.march(Vec3::new(0.5, 0.5, 0.5), Vec3::Y, 100.0, &world, &view, |step| {
            highest = highest.max(step.pos.y);
        });
        assert_eq!(highest, 1);
    }
}
