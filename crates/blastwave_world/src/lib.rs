//! # BLASTWAVE World
//!
//! An in-memory voxel world that hosts explosions.
//!
//! - [`MemoryWorld`]: chunked voxels, entities, drops and effects, with
//!   every `blastwave_core` collaborator trait implemented
//! - [`collision`]: voxel DDA used for line-of-sight exposure
//! - [`SharedWorld`]: `RwLock` handle that runs both explosion phases
//!   under one write lock

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod chunk;
pub mod collision;
pub mod shared;
pub mod world;

pub use chunk::{Chunk, ChunkCoord, CHUNK_SIZE};
pub use collision::{first_hit, segment_blocked, SegmentHit};
pub use shared::SharedWorld;
pub use world::{DroppedItem, EffectRecord, EntityRecord, MemoryWorld, DEFAULT_HEIGHT, DEFAULT_MIN_Y};
