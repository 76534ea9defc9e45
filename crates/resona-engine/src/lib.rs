//! Resona Engine - realtime mixing and playback for experiment stimuli.
//!
//! This crate owns the hardware audio stream and mixes queued, timed PCM
//! onto a stereo output inside the driver's realtime callback. Control code
//! enqueues [`CanonicalSound`](resona_core::CanonicalSound) buffers with a
//! presentation time; the callback schedules them sample-accurately, reports
//! its latency, and flags playback that arrived too late to start on time.
//!
//! # Architecture
//!
//! ```text
//! control thread                      audio thread (realtime)
//! ──────────────                      ───────────────────────
//! AudioEngine::play ──┐
//!                     │  SPSC ring per channel
//!                     ├──────────────────────────▶ Mixer::mix_into
//! pause/resume/stop ──┘  atomic flags                  │
//!                                                      ▼
//! take_warning ◀──────── atomics (latency, lateness, done-at)
//! ```
//!
//! The callback is the sole consumer of every channel queue and the sole
//! writer of the timing atomics; control code is the sole producer. Neither
//! side takes a lock, and the callback never allocates.
//!
//! # Components
//!
//! - [`AudioEngine`] - setup/play/pause/resume/stop/close lifecycle
//! - [`AudioBackend`] - pluggable device layer ([`CpalBackend`] by default,
//!   [`mock::MockBackend`] for deterministic tests)
//! - [`SoundCache`] - bounded LRU of canonicalized sounds
//! - [`load`] / [`save`] - WAV import/export at the interface boundary

pub mod backend;
pub mod cache;
pub mod cpal_backend;
pub mod engine;
mod mixer;
pub mod mock;
mod queue;
pub mod wav;

pub use backend::{
    AudioBackend, AudioDevice, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle,
    StreamTiming,
};
pub use cache::{CacheKey, SoundCache};
pub use cpal_backend::CpalBackend;
pub use engine::{AudioEngine, EngineConfig};
pub use wav::{WavInfo, load, save};

use resona_core::SoundError;

/// Errors surfaced by the playback engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The audio device rejected the requested configuration or failed at
    /// runtime.
    #[error("audio device error: {0}")]
    Device(String),

    /// No audio output device is available on the system.
    #[error("no audio output device available")]
    NoDevice,

    /// The engine has not been set up, or has been closed.
    #[error("audio engine is not initialized")]
    NotReady,

    /// Automatic channel selection found no idle, unpaused channel.
    #[error("no idle unpaused channel is available")]
    NoChannels,

    /// The requested channel index does not exist.
    #[error("channel {0} does not exist")]
    BadChannel(usize),

    /// The target queue slot is still occupied; the caller should retry
    /// after the next callback has drained it.
    #[error("channel queue is full; retry after the next callback")]
    QueueFull,

    /// A sound-model error, most commonly a rate mismatch against the
    /// engine's configured rate.
    #[error(transparent)]
    Sound(#[from] SoundError),

    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
