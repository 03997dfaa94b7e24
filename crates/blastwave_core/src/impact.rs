//! # Entity Impact Resolution
//!
//! Turns exposure and distance into damage and knockback for every entity
//! within the explosion's diameter.
//!
//! ```text
//! ratio    = |feet - center| / (2 * radius)          (entities need ratio < 1)
//! p        = (1 - ratio) * exposure
//! damage   = floor(((p^2 + p) / 2) * 7 * diameter + 1)
//! impulse  = normalize(reference - center) * dampen(p)
//! ```

use std::collections::BTreeMap;

use blastwave_shared::{Aabb, Vec3};

use crate::config::ExplosionConfig;
use crate::entity::{EntityId, EntitySnapshot};
use crate::explosion::Explosion;
use crate::exposure::ExposureCalculator;
use crate::world::CollisionQuery;

/// Damage and knockback computed for one entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityImpact {
    /// Target entity.
    pub entity: EntityId,
    /// Velocity added to the entity.
    pub impulse: Vec3,
    /// Damage dealt.
    pub damage: f32,
    /// Visible fraction of the entity's box.
    pub exposure: f64,
    /// `1 - distance / diameter`.
    pub proximity: f64,
}

/// Every impact of one detonation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImpactReport {
    /// One record per affected entity.
    pub impacts: BTreeMap<EntityId, EntityImpact>,
    /// Knockback to replay on player clients.
    pub player_knockback: BTreeMap<EntityId, Vec3>,
}

impl ImpactReport {
    /// Number of affected entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.impacts.len()
    }

    /// True if no entity was affected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.impacts.is_empty()
    }

    /// Impact recorded for `entity`.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<&EntityImpact> {
        self.impacts.get(&entity)
    }
}

/// Computes entity impacts for an explosion.
#[derive(Clone, Debug)]
pub struct EntityImpactResolver {
    exposure: ExposureCalculator,
    damage_scale: f64,
    search_margin: f64,
}

impl EntityImpactResolver {
    /// Creates a resolver from the configured damage curve.
    #[must_use]
    pub fn new(config: &ExplosionConfig) -> Self {
        Self {
            exposure: ExposureCalculator::new(),
            damage_scale: config.damage_scale,
            search_margin: config.entity_search_margin,
        }
    }

    /// Box that holds every entity the explosion can reach.
    #[must_use]
    pub fn search_box(&self, explosion: &Explosion) -> Aabb {
        let reach = f64::from(explosion.radius()) * 2.0 + self.search_margin;
        let center = explosion.center();
        Aabb::new(
            (center - Vec3::splat(reach)).floor(),
            (center + Vec3::splat(reach)).floor(),
        )
    }

    /// Damage for an effective proximity `p` and `diameter`.
    #[must_use]
    pub fn damage_for(&self, p: f64, diameter: f64) -> f32 {
        (((p * p + p) / 2.0) * self.damage_scale * diameter + 1.0).floor() as f32
    }

    /// Resolves impacts for `candidates`.
    ///
    /// Immune entities, entities ignoring explosions and the explosion's own
    /// source are skipped entirely. A zero radius affects nobody.
    pub fn resolve<W: CollisionQuery + ?Sized>(
        &self,
        explosion: &Explosion,
        candidates: &[EntitySnapshot],
        world: &W,
    ) -> ImpactReport {
        let mut report = ImpactReport::default();
        let diameter = f64::from(explosion.radius()) * 2.0;
        if diameter <= 0.0 {
            return report;
        }
        let center = explosion.center();
        for entity in candidates {
            if entity.explosion_immune || entity.ignores_explosions {
                continue;
            }
            if explosion.source() == Some(entity.id) || report.impacts.contains_key(&entity.id) {
                continue;
            }
            let ratio = entity.position.distance(center) / diameter;
            if ratio.is_nan() || ratio >= 1.0 {
                continue;
            }
            let direction = (entity.reference_point() - center).normalize_or_zero();
            let exposure = self.exposure.exposure_fraction(world, center, &entity.bounds);
            let proximity = 1.0 - ratio;
            let p = proximity * exposure;
            let knockback = explosion.knockback().dampen(entity, p);
            let impulse = direction * knockback;
            report.impacts.insert(
                entity.id,
                EntityImpact {
                    entity: entity.id,
                    impulse,
                    damage: self.damage_for(p, diameter),
                    exposure,
                    proximity,
                },
            );
            if entity.is_replay_target() {
                report.player_knockback.insert(entity.id, impulse);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{BlastProtectionDampener, EntityCategory, PlayerAbilities};
    use crate::test_support::FakeWorld;
    use std::sync::Arc;

    fn zombie(id: u64, feet: Vec3) -> EntitySnapshot {
        EntitySnapshot::new(EntityId(id), feet, 0.6, 1.95, EntityCategory::Living { blast_protection: 0 })
    }

    fn player(id: u64, feet: Vec3, abilities: PlayerAbilities) -> EntitySnapshot {
        EntitySnapshot::new(
            EntityId(id),
            feet,
            0.6,
            1.8,
            EntityCategory::Player {
                abilities,
                blast_protection: 0,
            },
        )
    }

    fn resolver() -> EntityImpactResolver {
        EntityImpactResolver::new(&ExplosionConfig::default())
    }

    #[test]
    fn test_entity_at_origin_takes_max_damage() {
        let world = FakeWorld::new();
        let explosion = Explosion::builder(Vec3::ZERO, 4.0).build().unwrap();
        let report = resolver().resolve(&explosion, &[zombie(1, Vec3::ZERO)], &world);
        let impact = report.get(EntityId(1)).unwrap();
        assert_eq!(impact.exposure, 1.0);
        // ((1 + 1) / 2) * 7 * 8 + 1
        assert_eq!(impact.damage, 57.0);
        assert!(impact.impulse.y > 0.0);
    }

    #[test]
    fn test_diameter_boundary_excluded() {
        let world = FakeWorld::new();
        let explosion = Explosion::builder(Vec3::ZERO, 2.0).build().unwrap();
        let report = resolver().resolve(
            &explosion,
            &[zombie(1, Vec3::new(4.0, 0.0, 0.0)), zombie(2, Vec3::new(3.9, 0.0, 0.0))],
            &world,
        );
        assert!(report.get(EntityId(1)).is_none());
        assert!(report.get(EntityId(2)).is_some());
    }

    #[test]
    fn test_zero_radius_affects_nobody() {
        let world = FakeWorld::new();
        let explosion = Explosion::builder(Vec3::ZERO, 0.0).build().unwrap();
        let report = resolver().resolve(&explosion, &[zombie(1, Vec3::ZERO)], &world);
        assert!(report.is_empty());
    }

    #[test]
    fn test_opt_outs_are_excluded() {
        let world = FakeWorld::new();
        let mut immune = zombie(1, Vec3::new(1.0, 0.0, 0.0));
        immune.explosion_immune = true;
        let mut ignoring = zombie(2, Vec3::new(1.0, 0.0, 1.0));
        ignoring.ignores_explosions = true;
        let source = zombie(3, Vec3::ZERO);
        let explosion = Explosion::builder(Vec3::ZERO, 3.0)
            .source(EntityId(3))
            .build()
            .unwrap();
        let report = resolver().resolve(&explosion, &[immune, ignoring, source], &world);
        assert!(report.is_empty());
    }

    #[test]
    fn test_zero_direction_still_damaged() {
        let world = FakeWorld::new();
        let tnt = EntitySnapshot::new(EntityId(5), Vec3::ZERO, 0.98, 0.98, EntityCategory::PrimedExplosive);
        let explosion = Explosion::builder(Vec3::ZERO, 4.0).build().unwrap();
        let report = resolver().resolve(&explosion, &[tnt], &world);
        let impact = report.get(EntityId(5)).unwrap();
        assert_eq!(impact.impulse, Vec3::ZERO);
        assert!(impact.damage > 1.0);
    }

    #[test]
    fn test_player_replay_filtering() {
        let world = FakeWorld::new();
        let flying = PlayerAbilities {
            creative: true,
            flying: true,
            spectator: false,
        };
        let explosion = Explosion::builder(Vec3::ZERO, 4.0).build().unwrap();
        let report = resolver().resolve(
            &explosion,
            &[
                player(1, Vec3::new(1.0, 0.0, 0.0), PlayerAbilities::default()),
                player(2, Vec3::new(-1.0, 0.0, 0.0), flying),
            ],
            &world,
        );
        assert_eq!(report.len(), 2);
        assert!(report.player_knockback.contains_key(&EntityId(1)));
        assert!(!report.player_knockback.contains_key(&EntityId(2)));
    }

    #[test]
    fn test_heavy_blast_protection_cancels_knockback() {
        let world = FakeWorld::new();
        let armoured = EntitySnapshot::new(
            EntityId(1),
            Vec3::new(1.0, 0.0, 0.0),
            0.6,
            1.95,
            EntityCategory::Living { blast_protection: 8 },
        );
        let explosion = Explosion::builder(Vec3::ZERO, 4.0)
            .knockback(Arc::new(BlastProtectionDampener))
            .build()
            .unwrap();
        let report = resolver().resolve(&explosion, &[armoured], &world);
        let impact = report.get(EntityId(1)).unwrap();
        // p = 0.875, floor(0.875 * 8 * 0.15) = 1 > p
        assert_eq!(impact.impulse, Vec3::ZERO);
        assert!(impact.damage > 1.0);
    }

    #[test]
    fn test_search_box_covers_diameter() {
        let explosion = Explosion::builder(Vec3::new(0.5, 0.5, 0.5), 2.0).build().unwrap();
        let area = resolver().search_box(&explosion);
        assert_eq!(area.min, Vec3::new(-5.0, -5.0, -5.0));
        assert_eq!(area.max, Vec3::new(5.0, 5.0, 5.0));
    }
}
