//! # BLASTWAVE
//!
//! Voxel explosion engine.
//!
//! ## Crates
//!
//! - `core`: ray fan, exposure, entity impacts and the destruction commit
//! - `shared`: math primitives and presentation events
//! - `world`: in-memory world implementing every collaborator trait
//!
//! Binaries call [`init_telemetry`] once before doing anything else.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod telemetry;

pub use blastwave_core as core;
pub use blastwave_shared as shared;
pub use blastwave_world as world;

pub use telemetry::init_telemetry;
