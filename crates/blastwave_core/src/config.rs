//! # Explosion Configuration
//!
//! Tuning values for the explosion model, loaded once at startup.
//!
//! ```toml
//! ray_grid = 16
//! ray_step = 0.3
//! merge_cap = 16
//! ```
//!
//! Missing keys fall back to the defaults in `blastwave_shared::constants`.

use std::path::Path;

use blastwave_shared::constants;
use serde::{Deserialize, Serialize};

use crate::error::{ExplosionError, ExplosionResult};

/// Tuning values for ray tracing, damage and commit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplosionConfig {
    /// Edge length of the cube whose shell seeds the ray fan.
    pub ray_grid: u32,
    /// Distance a ray advances per step.
    pub ray_step: f64,
    /// Lower bound of the per-ray power multiplier.
    pub power_jitter_min: f32,
    /// Width of the per-ray power multiplier range.
    pub power_jitter_span: f32,
    /// Added to resistance before scaling by the step.
    pub resistance_bias: f32,
    /// Power lost on every step regardless of material.
    pub step_attenuation: f32,
    /// Per-slot item cap when merging drops.
    pub merge_cap: u32,
    /// Ignition chance denominator (`1 / ignition_chance` per voxel).
    pub ignition_chance: u32,
    /// Multiplier on the quadratic damage curve.
    pub damage_scale: f64,
    /// Extra margin around the diameter when querying entities.
    pub entity_search_margin: f64,
    /// Radius from which destructive explosions use the large particle.
    pub large_particle_min_radius: f32,
    /// Explosion sound volume.
    pub sound_volume: f32,
}

impl Default for ExplosionConfig {
    fn default() -> Self {
        Self {
            ray_grid: constants::RAY_GRID,
            ray_step: constants::RAY_STEP,
            power_jitter_min: constants::POWER_JITTER_MIN,
            power_jitter_span: constants::POWER_JITTER_SPAN,
            resistance_bias: constants::RESISTANCE_BIAS,
            step_attenuation: constants::STEP_ATTENUATION,
            merge_cap: constants::DROP_MERGE_CAP,
            ignition_chance: constants::IGNITION_CHANCE,
            damage_scale: constants::DAMAGE_SCALE,
            entity_search_margin: constants::ENTITY_SEARCH_MARGIN,
            large_particle_min_radius: constants::LARGE_PARTICLE_MIN_RADIUS,
            sound_volume: constants::SOUND_VOLUME,
        }
    }
}

impl ExplosionConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema or a
    /// value fails validation.
    pub fn from_toml_str(text: &str) -> ExplosionResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails to parse.
    pub fn from_file(path: impl AsRef<Path>) -> ExplosionResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks every value for a usable range.
    ///
    /// # Errors
    ///
    /// Returns [`ExplosionError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> ExplosionResult<()> {
        if self.ray_grid < 2 {
            return Err(invalid("ray_grid must be at least 2"));
        }
        if !(self.ray_step.is_finite() && self.ray_step > 0.0) {
            return Err(invalid("ray_step must be positive"));
        }
        if !(self.power_jitter_min.is_finite() && self.power_jitter_min >= 0.0) {
            return Err(invalid("power_jitter_min must be non-negative"));
        }
        if !(self.power_jitter_span.is_finite() && self.power_jitter_span >= 0.0) {
            return Err(invalid("power_jitter_span must be non-negative"));
        }
        if !(self.resistance_bias.is_finite() && self.resistance_bias >= 0.0) {
            return Err(invalid("resistance_bias must be non-negative"));
        }
        // Without attenuation a ray through open air never loses power.
        if !(self.step_attenuation.is_finite() && self.step_attenuation > 0.0) {
            return Err(invalid("step_attenuation must be positive"));
        }
        if self.merge_cap == 0 {
            return Err(invalid("merge_cap must be at least 1"));
        }
        if self.ignition_chance == 0 {
            return Err(invalid("ignition_chance must be at least 1"));
        }
        if !(self.damage_scale.is_finite() && self.damage_scale >= 0.0) {
            return Err(invalid("damage_scale must be non-negative"));
        }
        if !(self.entity_search_margin.is_finite() && self.entity_search_margin >= 0.0) {
            return Err(invalid("entity_search_margin must be non-negative"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ExplosionError {
    ExplosionError::InvalidConfig(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ExplosionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ExplosionConfig::from_toml_str("merge_cap = 8\nray_grid = 8\n")
            .expect("valid config");
        assert_eq!(config.merge_cap, 8);
        assert_eq!(config.ray_grid, 8);
        assert_eq!(config.ray_step, constants::RAY_STEP);
    }

    #[test]
    fn test_rejects_zero_attenuation() {
        let err = ExplosionConfig::from_toml_str("step_attenuation = 0.0").unwrap_err();
        assert!(matches!(err, ExplosionError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_unknown_key() {
        let err = ExplosionConfig::from_toml_str("blast_power = 3").unwrap_err();
        assert!(matches!(err, ExplosionError::Toml(_)));
    }
}
