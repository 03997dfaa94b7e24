//! # Exposure Sampling
//!
//! Fraction of an entity's bounding box visible from the explosion origin.
//!
//! The box is sampled on a regular grid with `1 / (2 * size + 1)` spacing
//! per axis, so every axis gets at least two samples. The x and z samples
//! are shifted by half the leftover spacing to centre the grid. Spacing is
//! never finer than `1 / MAX_AXIS_STEPS`, which bounds the sample count for
//! very large boxes.

use blastwave_shared::{Aabb, Vec3};

use crate::world::CollisionQuery;

/// Most grid intervals along one axis.
pub const MAX_AXIS_STEPS: u32 = 32;

/// Computes line-of-sight exposure of bounding boxes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExposureCalculator;

impl ExposureCalculator {
    /// Creates a calculator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Sample points for `bounds`, or `None` for boxes that cannot be
    /// sampled (flat, inverted or non-finite on some axis).
    #[must_use]
    pub fn sample_points(&self, bounds: &Aabb) -> Option<Vec<Vec3>> {
        if bounds.is_degenerate() {
            return None;
        }
        let size = bounds.size();
        if size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
            return None;
        }
        let min_step = 1.0 / f64::from(MAX_AXIS_STEPS);
        let step = Vec3::new(
            (1.0 / (size.x * 2.0 + 1.0)).max(min_step),
            (1.0 / (size.y * 2.0 + 1.0)).max(min_step),
            (1.0 / (size.z * 2.0 + 1.0)).max(min_step),
        );
        if !(step.is_finite() && step.x > 0.0 && step.y > 0.0 && step.z > 0.0) {
            return None;
        }
        let nx = (1.0 / step.x).floor();
        let ny = (1.0 / step.y).floor();
        let nz = (1.0 / step.z).floor();
        let shift_x = (1.0 - nx * step.x) / 2.0;
        let shift_z = (1.0 - nz * step.z) / 2.0;

        let (nx, ny, nz) = (nx as u32, ny as u32, nz as u32);
        let count = [nx, ny, nz]
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n as usize + 1))?;
        let mut points = Vec::with_capacity(count);
        for i in 0..=nx {
            let tx = f64::from(i) * step.x;
            for j in 0..=ny {
                let ty = f64::from(j) * step.y;
                for k in 0..=nz {
                    let tz = f64::from(k) * step.z;
                    points.push(Vec3::new(
                        lerp(bounds.min.x, bounds.max.x, tx) + shift_x,
                        lerp(bounds.min.y, bounds.max.y, ty),
                        lerp(bounds.min.z, bounds.max.z, tz) + shift_z,
                    ));
                }
            }
        }
        Some(points)
    }

    /// Fraction in `[0, 1]` of sample points with a clear line to `origin`.
    ///
    /// Unsampleable boxes have zero exposure.
    pub fn exposure_fraction<W: CollisionQuery + ?Sized>(&self, world: &W, origin: Vec3, bounds: &Aabb) -> f64 {
        let Some(points) = self.sample_points(bounds) else {
            return 0.0;
        };
        if points.is_empty() {
            return 0.0;
        }
        let visible = points.iter().filter(|&&p| !world.collides(origin, p)).count();
        visible as f64 / points.len() as f64
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeWorld;
    use blastwave_shared::VoxelPos;

    fn player_box(feet: Vec3) -> Aabb {
        Aabb::from_feet(feet, 0.6, 1.8)
    }

    #[test]
    fn test_sample_grid_shape() {
        let points = ExposureCalculator::new().sample_points(&player_box(Vec3::ZERO)).unwrap();
        // 1 / (2 * 0.6 + 1) -> 3 per x/z axis, 1 / (2 * 1.8 + 1) -> 5 on y
        assert_eq!(points.len(), 3 * 5 * 3);
        let bounds = player_box(Vec3::ZERO).inflate(1e-9);
        assert!(points.iter().all(|p| bounds.contains(*p)));
    }

    #[test]
    fn test_flat_box_has_no_exposure() {
        let world = FakeWorld::new();
        let flat = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0));
        let calc = ExposureCalculator::new();
        assert!(calc.sample_points(&flat).is_none());
        assert_eq!(calc.exposure_fraction(&world, Vec3::new(0.0, 5.0, 0.0), &flat), 0.0);
    }

    #[test]
    fn test_open_air_full_exposure() {
        let world = FakeWorld::new();
        let exposure = ExposureCalculator::new().exposure_fraction(
            &world,
            Vec3::new(0.5, 0.5, 0.5),
            &player_box(Vec3::new(3.5, 0.0, 0.5)),
        );
        assert_eq!(exposure, 1.0);
    }

    #[test]
    fn test_wall_blocks_exposure() {
        let mut world = FakeWorld::new();
        world.fill(VoxelPos::new(2, -1, -3), VoxelPos::new(2, 4, 3), "stone");
        let exposure = ExposureCalculator::new().exposure_fraction(
            &world,
            Vec3::new(0.5, 0.5, 0.5),
            &player_box(Vec3::new(4.5, 0.0, 0.5)),
        );
        assert_eq!(exposure, 0.0);
    }

    #[test]
    fn test_huge_box_sample_count_is_bounded() {
        let mut world = FakeWorld::new();
        world.fill(VoxelPos::new(-5, 0, -5), VoxelPos::new(-5, 0, -5), "stone");
        let calc = ExposureCalculator::new();
        let huge = Aabb::new(Vec3::ZERO, Vec3::new(1000.0, 1000.0, 1000.0));

        let points = calc.sample_points(&huge).unwrap();
        let per_axis = MAX_AXIS_STEPS as usize + 1;
        assert_eq!(points.len(), per_axis * per_axis * per_axis);
        assert!(points.iter().all(|p| huge.inflate(1e-6).contains(*p)));

        // Origin buried in stone: every sample is blocked.
        let exposure = calc.exposure_fraction(&world, Vec3::new(-4.5, 0.5, -4.5), &huge);
        assert_eq!(exposure, 0.0);
    }

    #[test]
    fn test_entity_at_origin_fully_exposed() {
        let world = FakeWorld::new();
        let exposure = ExposureCalculator::new().exposure_fraction(&world, Vec3::ZERO, &player_box(Vec3::ZERO));
        assert_eq!(exposure, 1.0);
    }
}
