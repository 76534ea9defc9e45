//! Onset/offset envelopes and level control.

use libm::{cosf, powf};
use resona_core::{IntoTime, Result, Sound, SoundError, Time};

const PI: f32 = core::f32::consts::PI;

/// Default onset/offset ramp length.
pub const DEFAULT_RAMP: Time = Time::ms(5.0);

/// Half-cosine rise value at position `k` of `len` frames: 0 at k=0, → 1.
#[inline]
fn rise(k: usize, len: usize) -> f32 {
    0.5 * (1.0 - cosf(PI * k as f32 / len as f32))
}

fn apply_envelope(s: &Sound, on_frames: usize, off_frames: usize) -> Sound {
    let channels = usize::from(s.nchannels());
    let frames = s.nframes();
    let mut out = s.to_float_vec();
    for k in 0..on_frames.min(frames) {
        let w = rise(k, on_frames);
        for ch in 0..channels {
            out[k * channels + ch] *= w;
        }
    }
    for j in 0..off_frames.min(frames) {
        // Mirror of the rise, counted from the final frame inward.
        let frame = frames - 1 - j;
        let w = rise(j, off_frames);
        for ch in 0..channels {
            out[frame * channels + ch] *= w;
        }
    }
    // Shape is preserved, so reconstruction cannot fail.
    Sound::from_interleaved(out, s.samplerate(), s.nchannels())
        .unwrap_or_else(|_| Sound::from_mono(Vec::new(), s.samplerate()))
}

/// Apply a raised-cosine window: half-cosine rise over `len`, sustain at
/// unity, half-cosine fall over `len`.
///
/// Fails with [`SoundError::DurationTooShort`] when the sound has no sustain
/// region left, i.e. `frames ≤ 2·⌊len·R⌋`.
pub fn ramp(s: &Sound, len: impl IntoTime) -> Result<Sound> {
    let ramp_frames = len.into_time().frames(s.samplerate());
    if s.nframes() <= 2 * ramp_frames {
        return Err(SoundError::DurationTooShort {
            frames: s.nframes(),
            ramp_frames,
        });
    }
    Ok(apply_envelope(s, ramp_frames, ramp_frames))
}

/// One-sided onset ramp.
pub fn rampon(s: &Sound, len: impl IntoTime) -> Result<Sound> {
    let ramp_frames = len.into_time().frames(s.samplerate());
    if s.nframes() < ramp_frames {
        return Err(SoundError::DurationTooShort {
            frames: s.nframes(),
            ramp_frames,
        });
    }
    Ok(apply_envelope(s, ramp_frames, 0))
}

/// One-sided offset ramp.
pub fn rampoff(s: &Sound, len: impl IntoTime) -> Result<Sound> {
    let ramp_frames = len.into_time().frames(s.samplerate());
    if s.nframes() < ramp_frames {
        return Err(SoundError::DurationTooShort {
            frames: s.nframes(),
            ramp_frames,
        });
    }
    Ok(apply_envelope(s, 0, ramp_frames))
}

/// Normalize to unit RMS, then attenuate by `db` decibels:
/// `10^(-db/20) · s / rms(s)`.
///
/// Presentation levels in an experiment are specified relative to a known
/// reference, so the signal's own level is divided out first. A silent input
/// has no level to normalize and is returned unchanged.
pub fn attenuate(s: &Sound, db: f32) -> Sound {
    let r = s.rms();
    if r == 0.0 {
        return s.clone();
    }
    let gain = powf(10.0, -db / 20.0) / r;
    let out = s.to_float_vec().into_iter().map(|x| x * gain).collect();
    Sound::from_interleaved(out, s.samplerate(), s.nchannels())
        .unwrap_or_else(|_| Sound::from_mono(Vec::new(), s.samplerate()))
}
