//! # Detonate
//!
//! Headless demo: builds a small arena, sets off one explosion and logs what
//! happened.
//!
//! ```bash
//! # Defaults
//! detonate
//!
//! # Custom tuning and palette, fixed seed
//! RUST_LOG=debug detonate --config data/explosion.toml --blocks data/blocks.toml --seed 7
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use blastwave::core::{
    seeded_rng, BlastProtectionDampener, BlockInteraction, BlockRegistry, BlockState, EntityCategory, Explosion,
    ExplosionConfig, ExplosionCoordinator, ExplosionError, ExplosionResult, FluidState, PlayerAbilities, Voxel,
    VoxelAccess,
};
use blastwave::shared::{EventBus, ExplosionEvent, Vec3, VoxelPos};
use blastwave::world::MemoryWorld;
use tracing::{error, info, warn};

const EVENT_CAPACITY: usize = 8192;

#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    blocks: Option<PathBuf>,
    seed: u64,
    radius: Option<f32>,
    fire: bool,
}

impl Options {
    fn parse() -> Result<Self, String> {
        let mut options = Self {
            seed: 42,
            ..Self::default()
        };
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            let mut value = || args.next().ok_or_else(|| format!("{arg} needs a value"));
            match arg.as_str() {
                "--config" => options.config = Some(PathBuf::from(value()?)),
                "--blocks" => options.blocks = Some(PathBuf::from(value()?)),
                "--seed" => options.seed = value()?.parse().map_err(|e| format!("bad seed: {e}"))?,
                "--radius" => options.radius = Some(value()?.parse().map_err(|e| format!("bad radius: {e}"))?),
                "--fire" => options.fire = true,
                other => return Err(format!("unknown argument: {other}")),
            }
        }
        Ok(options)
    }
}

/// Stone basin with a dirt floor, a sand pile, an obsidian pillar, a water
/// pocket and a button.
fn build_arena(world: &mut MemoryWorld) -> ExplosionResult<()> {
    let block = |world: &MemoryWorld, name: &str| -> ExplosionResult<BlockState> {
        Ok(BlockState::of(world.registry().require(name)?))
    };
    let stone = block(world, "stone")?;
    let dirt = block(world, "dirt")?;
    let grass = block(world, "grass")?;
    let sand = block(world, "sand")?;
    let obsidian = block(world, "obsidian")?;
    let button = block(world, "button")?;

    world.fill(VoxelPos::new(-12, -6, -12), VoxelPos::new(12, -4, 12), stone);
    world.fill(VoxelPos::new(-12, -3, -12), VoxelPos::new(12, -2, 12), dirt);
    world.fill(VoxelPos::new(-12, -1, -12), VoxelPos::new(12, -1, 12), grass);
    world.fill(VoxelPos::new(3, 0, -2), VoxelPos::new(5, 2, 0), sand);
    world.fill(VoxelPos::new(-3, 0, 3), VoxelPos::new(-3, 3, 3), obsidian);
    world.place(VoxelPos::new(0, 0, -3), button);

    if let Some(water) = world.registry().fluid_by_name("water") {
        let pocket = Voxel::fluid(FluidState::source(water));
        for x in -6..=-4 {
            world.place_voxel(VoxelPos::new(x, -1, -5), pocket);
        }
    }
    Ok(())
}

fn run(options: &Options) -> ExplosionResult<()> {
    let config = match &options.config {
        Some(path) => ExplosionConfig::from_file(path)?,
        None => ExplosionConfig::default(),
    };
    let registry = match &options.blocks {
        Some(path) => BlockRegistry::from_file(path)?,
        None => BlockRegistry::with_defaults(),
    };

    let bus = EventBus::new(EVENT_CAPACITY);
    let mut world = MemoryWorld::new(registry);
    world.attach_events(bus.sender());
    build_arena(&mut world)?;

    let zombie = world.spawn(EntityCategory::Living { blast_protection: 0 }, Vec3::new(2.5, 0.0, 2.5), 0.6, 1.95);
    let player = world.spawn(
        EntityCategory::Player {
            abilities: PlayerAbilities::default(),
            blast_protection: 4,
        },
        Vec3::new(-4.5, 0.0, -1.5),
        0.6,
        1.8,
    );
    let shielded = world.spawn(EntityCategory::Living { blast_protection: 0 }, Vec3::new(-4.5, 0.0, 3.5), 0.6, 1.95);

    let radius = options.radius.unwrap_or(4.0);
    let explosion = Explosion::builder(Vec3::new(0.5, 0.0, 0.5), radius)
        .fire(options.fire)
        .interaction(BlockInteraction::DestroyWithDecay)
        .knockback(Arc::new(BlastProtectionDampener))
        .build()?;

    info!(
        seed = options.seed,
        radius,
        fire = options.fire,
        chunks = world.chunk_count(),
        "arena ready"
    );

    let mut rng = seeded_rng(options.seed);
    let mut coordinator = ExplosionCoordinator::new(explosion, &config)?;
    coordinator.detonate(&mut world, &mut rng)?;
    info!(voxels = coordinator.affected_voxels().len(), "detonated");

    for impact in coordinator.impacts() {
        info!(
            entity = %impact.entity,
            damage = impact.damage,
            exposure = impact.exposure,
            impulse = %impact.impulse,
            "entity hit"
        );
    }

    let sender = bus.sender();
    for (entity, knockback) in coordinator.player_knockback() {
        if !sender.send(ExplosionEvent::PlayerKnockback {
            entity: entity.0,
            knockback,
        }) {
            warn!(%entity, "event bus full, knockback not replayed");
        }
    }

    let summary = coordinator.finalize(&mut world, &mut rng, true)?;
    info!(
        changed = summary.voxels_changed,
        rejected = summary.rejected_mutations,
        stacks = summary.stacks_emitted,
        items = summary.items_emitted,
        fires = summary.fires_lit,
        "finalized"
    );

    for id in [zombie, player, shielded] {
        if let Some(record) = world.entity(id) {
            info!(entity = %id, health = record.health, velocity = %record.velocity, "entity state");
        }
    }

    let events = bus.receiver().drain();
    let knockbacks = events
        .iter()
        .filter(|e| matches!(e, ExplosionEvent::PlayerKnockback { .. }))
        .count();
    let changes = events
        .iter()
        .filter(|e| matches!(e, ExplosionEvent::VoxelChanged { .. }))
        .count();
    info!(events = events.len(), changes, knockbacks, drops = world.drops().len(), "event bus drained");
    Ok(())
}

fn main() -> ExitCode {
    blastwave::init_telemetry("info");

    let options = match Options::parse() {
        Ok(options) => options,
        Err(message) => {
            error!("{message}");
            eprintln!("usage: detonate [--config FILE] [--blocks FILE] [--seed N] [--radius R] [--fire]");
            return ExitCode::from(2);
        }
    };

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ExplosionError::BlockHandler { pos, source }) => {
            error!(%pos, %source, "commit aborted");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
