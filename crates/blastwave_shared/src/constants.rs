//! # Explosion Tuning Constants
//!
//! Default values for the explosion model. `ExplosionConfig` in
//! `blastwave_core` starts from these and may override them from TOML.

// =============================================================================
// RAY FAN
// =============================================================================

/// Edge length of the logical cube whose outer shell seeds the ray fan.
pub const RAY_GRID: u32 = 16;

/// Number of rays produced by a `RAY_GRID` cube shell (16^3 - 14^3).
pub const RAY_COUNT: usize = 1352;

/// Distance advanced by a ray per step (world units).
pub const RAY_STEP: f64 = 0.3;

/// Lower bound of the per-ray power multiplier.
pub const POWER_JITTER_MIN: f32 = 0.7;

/// Width of the per-ray power multiplier range (`MIN .. MIN + SPAN`).
pub const POWER_JITTER_SPAN: f32 = 0.6;

/// Added to a voxel's resistance before it is scaled by the step length.
pub const RESISTANCE_BIAS: f32 = 0.3;

/// Power lost per step regardless of material (0.75 * step).
pub const STEP_ATTENUATION: f32 = 0.225;

// =============================================================================
// ENTITIES
// =============================================================================

/// Multiplier applied to the quadratic damage curve.
pub const DAMAGE_SCALE: f64 = 7.0;

/// Extra margin around the diameter when collecting candidate entities.
pub const ENTITY_SEARCH_MARGIN: f64 = 1.0;

// =============================================================================
// COMMIT
// =============================================================================

/// Maximum item count a single merged drop stack accumulates.
pub const DROP_MERGE_CAP: u32 = 16;

/// Ignition happens with probability `1 / IGNITION_CHANCE` per voxel.
pub const IGNITION_CHANCE: u32 = 3;

// =============================================================================
// PRESENTATION
// =============================================================================

/// Radius from which destructive explosions use the large emitter particle.
pub const LARGE_PARTICLE_MIN_RADIUS: f32 = 2.0;

/// Explosion sound volume.
pub const SOUND_VOLUME: f32 = 4.0;
