//! Resona Core - the sound value model for experiment stimuli
//!
//! This crate provides the data model consumed by the rest of the Resona
//! toolkit: an immutable PCM buffer tagged with its sample rate and channel
//! count, plus the dimensional time/frequency quantities used to address it.
//!
//! # Core Abstractions
//!
//! ## Sound Values
//!
//! - [`Sound`] - Interleaved PCM samples plus sample rate and channel count
//! - [`CanonicalSound`] - The engine's native format: 16-bit fixed-point,
//!   stereo, shareable across the realtime boundary
//! - [`SampleRange`] - A half-open time interval for slicing sounds
//!
//! ## Quantities
//!
//! Time and frequency values carry a dimensional tag so that mixing them up
//! is a compile error, while `time × rate` collapses to a plain frame count:
//!
//! - [`Time`] - Seconds (or milliseconds via [`Time::ms`])
//! - [`Freq`] - Hertz (or kilohertz via [`Freq::khz`])
//! - [`IntoTime`] / [`IntoFreq`] - Accept bare numbers with a warning,
//!   defaulting to seconds and Hertz
//!
//! # Example
//!
//! ```rust
//! use resona_core::{Sound, SampleRange, Time};
//!
//! let frames: Vec<f32> = (0..44100).map(|k| (k as f32 / 44100.0).sin()).collect();
//! let s = Sound::from_mono(frames, 44100);
//! assert_eq!(s.duration(), Time::secs(1.0));
//!
//! // First 100 ms
//! let head = s.slice(SampleRange::new(Time::secs(0.0), Time::ms(100.0))).unwrap();
//! assert_eq!(head.nframes(), 4410);
//! ```

pub mod error;
pub mod quantity;
pub mod sound;

pub use error::SoundError;
pub use quantity::{Freq, IntoFreq, IntoTime, Time};
pub use sound::{
    CanonicalSound, FIXED_SCALE, RawSamples, SampleRange, Samples, Sound, f32_to_fixed,
    fixed_to_f32,
};

/// Convenience result type for sound-model operations.
pub type Result<T> = core::result::Result<T, SoundError>;
