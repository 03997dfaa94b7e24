//! # Explosion Error Types
//!
//! Configuration errors are rejected up front; world-boundary conditions are
//! not errors at all; block handler failures propagate out of `finalize`.

use blastwave_shared::{Vec3, VoxelPos};
use thiserror::Error;

use crate::explosion::ExplosionState;

/// Errors that can occur while building or running an explosion.
#[derive(Error, Debug)]
pub enum ExplosionError {
    /// Radius was negative or not a finite number.
    #[error("invalid explosion radius: {0}")]
    InvalidRadius(f32),

    /// Origin had a non-finite component.
    #[error("invalid explosion origin: {0}")]
    InvalidOrigin(Vec3),

    /// An operation was attempted from a state that does not allow it.
    #[error("cannot {operation} an explosion in state {state:?}")]
    InvalidState {
        /// The refused operation.
        operation: &'static str,
        /// State the explosion was in.
        state: ExplosionState,
    },

    /// Invalid configuration file or value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A block type name was not found in the registry.
    #[error("unknown block: {0}")]
    UnknownBlock(String),

    /// A block's explosion-hit handler failed.
    #[error("block handler failed at {pos}")]
    BlockHandler {
        /// Voxel being converted when the handler failed.
        pos: VoxelPos,
        /// The handler's error.
        #[source]
        source: BlockHandlerError,
    },

    /// Reading a configuration file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file was not valid TOML for its schema.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised by block-specific explosion-hit handlers.
///
/// A failing handler is a programming error in that block's definition; the
/// committer stops and reports it instead of guessing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockHandlerError {
    /// The handler does not understand the block state it was given.
    #[error("block {block} has unsupported state meta {meta}")]
    UnsupportedState {
        /// Block name.
        block: String,
        /// Offending metadata.
        meta: u8,
    },

    /// Any other handler failure.
    #[error("{0}")]
    Other(String),
}

/// Result type for explosion operations.
pub type ExplosionResult<T> = Result<T, ExplosionError>;
