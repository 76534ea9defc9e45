//! Resona DSP - stimulus synthesis primitives
//!
//! Pure functions producing [`Sound`](resona_core::Sound) values for
//! psychoacoustic stimuli. Everything here is offline construction code: the
//! realtime engine only ever sees the canonical fixed-point output of
//! [`canonicalize`].
//!
//! # Primitives
//!
//! ## Generators
//!
//! - [`silence`] / [`noise`] / [`noise_stereo`] - zero and uniform buffers
//! - [`tone`] / [`tone_with_phase`] - pure sinusoids
//! - [`harmonic_complex`] - cycle-tiled sums of harmonics
//!
//! ## Shaping
//!
//! - [`ramp`] / [`rampon`] / [`rampoff`] - raised-cosine onset/offset windows
//! - [`attenuate`] - RMS-normalized attenuation in dB
//! - [`lowpass`] / [`highpass`] / [`bandpass`] / [`bandstop`] - Butterworth
//!   filters of configurable order
//!
//! ## Combination
//!
//! - [`mix`] (zero-padded sum) / [`mult`] (one-padded product)
//! - [`leftright`] - stereo assembly from two channels
//! - [`concat`] - sequential concatenation
//! - [`fadeto`] - crossfade between two sounds
//!
//! ## Format
//!
//! - [`resample`] - rational polyphase rate conversion
//! - [`canonicalize`] - clip + fixed-point + stereo + resample to the
//!   engine's native format
//!
//! # Example
//!
//! ```rust
//! use resona_core::{Freq, Time};
//! use resona_dsp::{attenuate, ramp, tone};
//!
//! // A 1 kHz tone, 100 ms, 5 ms raised-cosine ramps, 20 dB down from unit RMS.
//! let s = tone(Freq::hz(1000.0), Time::ms(100.0), 44100);
//! let s = ramp(&s, Time::ms(5.0)).unwrap();
//! let s = attenuate(&s, 20.0);
//! assert_eq!(s.nframes(), 4410);
//! ```

pub mod canonical;
pub mod combine;
pub mod envelope;
pub mod filter;
pub mod generate;
pub mod resample;

pub use canonical::canonicalize;
pub use combine::{concat, fadeto, leftright, mix, mult, DEFAULT_CROSSFADE};
pub use envelope::{attenuate, ramp, rampoff, rampon, DEFAULT_RAMP};
pub use filter::{bandpass, bandstop, highpass, lowpass, DEFAULT_FILTER_ORDER};
pub use generate::{harmonic_complex, noise, noise_stereo, silence, tone, tone_with_phase, NoiseRng};
pub use resample::resample;
