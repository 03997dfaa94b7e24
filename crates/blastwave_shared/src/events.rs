//! # Presentation Events
//!
//! Explosions produce presentation side effects (sound, particles, client
//! knockback replay) that the engine never renders itself. Worlds forward
//! them over a bounded channel to whoever draws or networks them.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │  Explosion  │─────>│   Event     │─────>│  Renderer / │
//! │  (finalize) │      │   Bus       │      │  Net replay │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

use crate::math::{Vec3, VoxelPos};

/// Particle kinds an explosion may spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Single puff, used by small or non-destructive explosions.
    Explosion,
    /// Emitter that spawns a burst of puffs, used by large destructive ones.
    ExplosionEmitter,
    /// Smoke trail.
    Smoke,
}

/// Sound identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundId(pub String);

impl SoundId {
    /// Creates a sound id from any string-like value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The generic explosion sound.
    #[must_use]
    pub fn explode() -> Self {
        Self::new("entity.generic.explode")
    }
}

/// Events published by worlds while explosions resolve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExplosionEvent {
    /// A sound should be played.
    Sound {
        /// Sound to play.
        sound: SoundId,
        /// World position.
        position: Vec3,
        /// Volume.
        volume: f32,
        /// Pitch.
        pitch: f32,
    },

    /// A particle should be spawned.
    Particle {
        /// Particle kind.
        kind: ParticleKind,
        /// World position.
        position: Vec3,
        /// Initial velocity.
        velocity: Vec3,
    },

    /// A voxel was removed or replaced by an explosion.
    VoxelChanged {
        /// Voxel coordinate.
        pos: VoxelPos,
        /// New raw block id.
        block: u16,
    },

    /// A player received knockback that clients must replay locally.
    PlayerKnockback {
        /// Raw entity id of the player.
        entity: u64,
        /// Knockback after armour dampening.
        knockback: Vec3,
    },
}

/// Bounded event bus.
///
/// Channels are bounded so a stalled consumer cannot grow memory without
/// limit; producers drop events instead.
pub struct EventBus {
    /// Handed to worlds.
    sender: Sender<ExplosionEvent>,
    /// Handed to renderers and replication.
    receiver: Receiver<ExplosionEvent>,
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// A producer handle. Any number may exist.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// A consumer handle. Consumers share one queue; each event is seen once.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Shortcut for a bus whose only use is one sender and one receiver.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (EventSender, EventReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }
}

/// Producer side of the bus.
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: Sender<ExplosionEvent>,
}

impl EventSender {
    /// Queues `event` without blocking.
    ///
    /// Returns `false` if the channel is full or the receiver is gone; the
    /// event is dropped in both cases.
    #[inline]
    pub fn send(&self, event: ExplosionEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer side of the bus.
#[derive(Clone, Debug)]
pub struct EventReceiver {
    receiver: Receiver<ExplosionEvent>,
}

impl EventReceiver {
    /// Takes every queued event, oldest first.
    #[inline]
    #[must_use]
    pub fn drain(&self) -> Vec<ExplosionEvent> {
        self.receiver.try_iter().collect()
    }

    /// Takes the oldest queued event, if any.
    #[inline]
    #[must_use]
    pub fn try_recv(&self) -> Option<ExplosionEvent> {
        self.receiver.try_recv().ok()
    }

    /// Events waiting to be taken.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// True if at least one event is queued.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}
