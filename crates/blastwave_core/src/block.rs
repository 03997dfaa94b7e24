//! # Blocks & Fluids
//!
//! Voxel contents as the explosion engine sees them: a block state plus a
//! fluid state, resolved against a [`BlockRegistry`] of type descriptors.
//!
//! ## Registry Layout
//!
//! Id 0 is always air and fluid id 0 is always "no fluid". Ids are dense and
//! assigned in registration order, so a registry loaded from the same TOML
//! always produces the same ids.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ExplosionError, ExplosionResult};
use crate::handler::{ExplosionHitHandler, HandlerKind, NoDrops};
use crate::item::{ItemId, DEFAULT_MAX_STACK};

/// Block type identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    /// Air is always id 0.
    pub const AIR: Self = Self(0);
}

/// A block type plus its per-voxel metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockState {
    /// Block type.
    pub block: BlockId,
    /// Metadata (orientation, powered bit, ...).
    pub meta: u8,
}

impl BlockState {
    /// The air state.
    pub const AIR: Self = Self {
        block: BlockId::AIR,
        meta: 0,
    };

    /// Default state of a block type.
    #[inline]
    #[must_use]
    pub const fn of(block: BlockId) -> Self {
        Self { block, meta: 0 }
    }

    /// State with explicit metadata.
    #[inline]
    #[must_use]
    pub const fn with_meta(block: BlockId, meta: u8) -> Self {
        Self { block, meta }
    }
}

/// Fluid type identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FluidId(pub u8);

impl FluidId {
    /// "No fluid" is always id 0.
    pub const EMPTY: Self = Self(0);
}

/// A fluid occupying a voxel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FluidState {
    /// Fluid type.
    pub fluid: FluidId,
    /// Fill level (8 = source).
    pub level: u8,
}

impl FluidState {
    /// The empty fluid state.
    pub const EMPTY: Self = Self {
        fluid: FluidId::EMPTY,
        level: 0,
    };

    /// A full source of the given fluid.
    #[inline]
    #[must_use]
    pub const fn source(fluid: FluidId) -> Self {
        Self { fluid, level: 8 }
    }

    /// Returns true if no fluid is present.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fluid.0 == FluidId::EMPTY.0
    }
}

/// Everything stored in one voxel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voxel {
    /// Block state.
    pub block: BlockState,
    /// Fluid state.
    pub fluid: FluidState,
}

impl Voxel {
    /// An empty voxel.
    pub const AIR: Self = Self {
        block: BlockState::AIR,
        fluid: FluidState::EMPTY,
    };

    /// A voxel holding only a block.
    #[inline]
    #[must_use]
    pub const fn block(block: BlockState) -> Self {
        Self {
            block,
            fluid: FluidState::EMPTY,
        }
    }

    /// A voxel holding only a fluid.
    #[inline]
    #[must_use]
    pub const fn fluid(fluid: FluidState) -> Self {
        Self {
            block: BlockState::AIR,
            fluid,
        }
    }
}

/// Descriptor of a block type.
#[derive(Clone, Debug)]
pub struct BlockType {
    /// Unique name.
    pub name: String,
    /// Explosion resistance.
    pub resistance: f32,
    /// True only for air-like blocks that explosions pass through for free.
    pub air: bool,
    /// Renders as a full opaque cube; fire can sit on top of it.
    pub solid_render: bool,
    /// Blocks line of sight for exposure sampling.
    pub collision: bool,
    /// Item dropped when the block is destroyed, if any.
    pub drop_item: Option<ItemId>,
    /// Stack limit of the dropped item.
    pub drop_max_stack: u32,
    /// What happens when an explosion reaches this block.
    pub handler: Arc<dyn ExplosionHitHandler>,
}

impl BlockType {
    /// A full solid cube that drops nothing until configured otherwise.
    #[must_use]
    pub fn solid(name: impl Into<String>, resistance: f32) -> Self {
        Self {
            name: name.into(),
            resistance,
            air: false,
            solid_render: true,
            collision: true,
            drop_item: None,
            drop_max_stack: DEFAULT_MAX_STACK,
            handler: Arc::new(NoDrops),
        }
    }

    /// The air descriptor.
    #[must_use]
    pub fn air() -> Self {
        Self {
            air: true,
            solid_render: false,
            collision: false,
            ..Self::solid("air", 0.0)
        }
    }

    /// Marks the block as non-solid: no collision, not a full cube.
    #[must_use]
    pub fn non_solid(mut self) -> Self {
        self.solid_render = false;
        self.collision = false;
        self
    }

    /// Sets the dropped item.
    #[must_use]
    pub fn with_drop(mut self, item: ItemId) -> Self {
        self.drop_item = Some(item);
        self
    }

    /// Sets the explosion-hit handler.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn ExplosionHitHandler>) -> Self {
        self.handler = handler;
        self
    }
}

/// Descriptor of a fluid type.
#[derive(Clone, Debug, PartialEq)]
pub struct FluidType {
    /// Unique name.
    pub name: String,
    /// Explosion resistance.
    pub resistance: f32,
}

/// Block and fluid descriptors indexed by id.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    blocks: Vec<BlockType>,
    fluids: Vec<FluidType>,
    by_name: HashMap<String, BlockId>,
    /// Returned for ids nobody registered: indestructible, opaque, no drops.
    unknown: BlockType,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Creates a registry holding only air and the empty fluid.
    #[must_use]
    pub fn new() -> Self {
        let air = BlockType::air();
        let mut by_name = HashMap::new();
        by_name.insert(air.name.clone(), BlockId::AIR);
        Self {
            blocks: vec![air],
            fluids: vec![FluidType {
                name: "empty".to_string(),
                resistance: 0.0,
            }],
            by_name,
            unknown: BlockType::solid("unknown", f32::INFINITY),
        }
    }

    /// Creates a registry with the built-in palette.
    ///
    /// | name | resistance | on explosion |
    /// |---|---|---|
    /// | stone | 6.0 | drops itself |
    /// | dirt | 0.5 | drops itself |
    /// | grass | 0.6 | drops dirt |
    /// | sand | 0.5 | drops itself |
    /// | planks | 3.0 | drops itself |
    /// | glass | 0.3 | shatters |
    /// | obsidian | 1200 | drops itself |
    /// | bedrock | 3600000 | never reached |
    /// | tnt | 0.0 | removed, no drop |
    /// | fire | 0.0 | removed, no drop |
    /// | button | 0.5 | toggles / drops |
    ///
    /// Water and lava are registered as fluids with resistance 100.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        if let Err(e) = registry.register_builtins() {
            warn!(error = %e, "built-in palette incomplete");
        }
        registry
    }

    fn register_builtins(&mut self) -> ExplosionResult<()> {
        let drop_self = HandlerKind::DropSelf.handler();
        for (name, resistance) in [
            ("stone", 6.0),
            ("dirt", 0.5),
            ("grass", 0.6),
            ("sand", 0.5),
            ("planks", 3.0),
        ] {
            let id = self.next_id()?;
            self.register(
                BlockType::solid(name, resistance)
                    .with_drop(ItemId(u32::from(id.0)))
                    .with_handler(Arc::clone(&drop_self)),
            )?;
        }
        // Grass drops dirt.
        let dirt = self.by_name("dirt").map(|id| ItemId(u32::from(id.0)));
        if let (Some(grass), Some(dirt)) = (self.by_name("grass"), dirt) {
            self.blocks[usize::from(grass.0)].drop_item = Some(dirt);
        }
        self.register(BlockType::solid("glass", 0.3))?;
        let obsidian = self.next_id()?;
        self.register(
            BlockType::solid("obsidian", 1200.0)
                .with_drop(ItemId(u32::from(obsidian.0)))
                .with_handler(Arc::clone(&drop_self)),
        )?;
        self.register(BlockType::solid("bedrock", 3_600_000.0))?;
        self.register(BlockType::solid("tnt", 0.0))?;
        self.register(BlockType::solid("fire", 0.0).non_solid())?;
        let button = self.next_id()?;
        self.register(
            BlockType::solid("button", 0.5)
                .non_solid()
                .with_drop(ItemId(u32::from(button.0)))
                .with_handler(HandlerKind::Trigger.handler()),
        )?;
        self.register_fluid(FluidType {
            name: "water".to_string(),
            resistance: 100.0,
        })?;
        self.register_fluid(FluidType {
            name: "lava".to_string(),
            resistance: 100.0,
        })?;
        Ok(())
    }

    /// Loads a registry from TOML `[[block]]` and `[[fluid]]` tables.
    ///
    /// ```toml
    /// [[block]]
    /// name = "stone"
    /// resistance = 6.0
    /// drops = true
    /// handler = "drop_self"
    ///
    /// [[fluid]]
    /// name = "water"
    /// resistance = 100.0
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML, duplicate names, negative
    /// resistance values or more types than the id width holds.
    pub fn from_toml_str(text: &str) -> ExplosionResult<Self> {
        let file: RegistryFile = toml::from_str(text)?;
        let mut registry = Self::new();
        for spec in file.block {
            if registry.by_name.contains_key(&spec.name) {
                return Err(ExplosionError::InvalidConfig(format!(
                    "duplicate block name: {}",
                    spec.name
                )));
            }
            if spec.resistance.is_nan() || spec.resistance < 0.0 {
                return Err(ExplosionError::InvalidConfig(format!(
                    "block {} has invalid resistance {}",
                    spec.name, spec.resistance
                )));
            }
            let id = registry.next_id()?;
            let mut block = BlockType::solid(spec.name, spec.resistance)
                .with_handler(spec.handler.handler());
            block.solid_render = spec.solid;
            block.collision = spec.collision;
            block.drop_max_stack = spec.max_stack;
            if spec.drops {
                block.drop_item = Some(ItemId(u32::from(id.0)));
            }
            registry.register(block)?;
        }
        for spec in file.fluid {
            if registry.fluid_by_name(&spec.name).is_some() {
                return Err(ExplosionError::InvalidConfig(format!(
                    "duplicate fluid name: {}",
                    spec.name
                )));
            }
            if spec.resistance.is_nan() || spec.resistance < 0.0 {
                return Err(ExplosionError::InvalidConfig(format!(
                    "fluid {} has invalid resistance {}",
                    spec.name, spec.resistance
                )));
            }
            registry.register_fluid(spec.into())?;
        }
        Ok(registry)
    }

    /// Reads a registry file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails to parse.
    pub fn from_file(path: impl AsRef<Path>) -> ExplosionResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn next_id(&self) -> ExplosionResult<BlockId> {
        u16::try_from(self.blocks.len())
            .map(BlockId)
            .map_err(|_| ExplosionError::InvalidConfig(format!("block palette is full at {} types", self.blocks.len())))
    }

    /// Registers a block type and returns its id.
    ///
    /// Registering a name twice replaces the name lookup but keeps both ids.
    ///
    /// # Errors
    ///
    /// Returns [`ExplosionError::InvalidConfig`] once every [`BlockId`] is taken.
    pub fn register(&mut self, block: BlockType) -> ExplosionResult<BlockId> {
        let id = self.next_id()?;
        self.by_name.insert(block.name.clone(), id);
        self.blocks.push(block);
        Ok(id)
    }

    /// Registers a fluid type and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`ExplosionError::InvalidConfig`] once every [`FluidId`] is taken.
    pub fn register_fluid(&mut self, fluid: FluidType) -> ExplosionResult<FluidId> {
        let id = u8::try_from(self.fluids.len())
            .map(FluidId)
            .map_err(|_| ExplosionError::InvalidConfig(format!("fluid palette is full at {} types", self.fluids.len())))?;
        self.fluids.push(fluid);
        Ok(id)
    }

    /// Descriptor for `id`, if registered.
    #[inline]
    #[must_use]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(usize::from(id.0))
    }

    /// Descriptor for `id`, falling back to an indestructible placeholder.
    #[inline]
    #[must_use]
    pub fn block(&self, id: BlockId) -> &BlockType {
        self.get(id).unwrap_or(&self.unknown)
    }

    /// Descriptor for a fluid, if registered.
    #[inline]
    #[must_use]
    pub fn fluid(&self, id: FluidId) -> Option<&FluidType> {
        self.fluids.get(usize::from(id.0))
    }

    /// Looks up a block id by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Looks up a block id by name, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ExplosionError::UnknownBlock`] if no block has that name.
    pub fn require(&self, name: &str) -> ExplosionResult<BlockId> {
        self.by_name(name)
            .ok_or_else(|| ExplosionError::UnknownBlock(name.to_string()))
    }

    /// Looks up a fluid id by name.
    #[must_use]
    pub fn fluid_by_name(&self, name: &str) -> Option<FluidId> {
        self.fluids
            .iter()
            .position(|f| f.name == name)
            .and_then(|i| u8::try_from(i).ok())
            .map(FluidId)
    }

    /// The block explosions place when igniting, if the palette has one.
    #[must_use]
    pub fn fire_block(&self) -> Option<BlockId> {
        self.by_name("fire")
    }

    /// True if the voxel holds neither a block nor a fluid.
    #[inline]
    #[must_use]
    pub fn is_empty_voxel(&self, voxel: &Voxel) -> bool {
        self.block(voxel.block.block).air && voxel.fluid.is_empty()
    }

    /// Number of registered block types, air included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: air is always registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    #[serde(default)]
    block: Vec<BlockSpec>,
    #[serde(default)]
    fluid: Vec<FluidSpec>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BlockSpec {
    name: String,
    resistance: f32,
    #[serde(default = "yes")]
    solid: bool,
    #[serde(default = "yes")]
    collision: bool,
    #[serde(default)]
    drops: bool,
    #[serde(default = "default_max_stack")]
    max_stack: u32,
    #[serde(default)]
    handler: HandlerKind,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FluidSpec {
    name: String,
    resistance: f32,
}

impl From<FluidSpec> for FluidType {
    fn from(spec: FluidSpec) -> Self {
        Self {
            name: spec.name,
            resistance: spec.resistance,
        }
    }
}

const fn yes() -> bool {
    true
}

const fn default_max_stack() -> u32 {
    DEFAULT_MAX_STACK
}
