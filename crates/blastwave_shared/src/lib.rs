//! # BLASTWAVE Shared
//!
//! Common types used by the explosion engine, world implementations and
//! presentation consumers.
//!
//! ## Rule
//!
//! This crate holds data, not behaviour: math primitives, default tuning
//! constants and presentation events. Engine logic lives in `blastwave_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod events;
pub mod math;

pub use events::{EventBus, EventReceiver, EventSender, ExplosionEvent, ParticleKind, SoundId};
pub use math::{Aabb, Vec3, VoxelPos};
