//! Canonicalization to the engine's native format.

use resona_core::{CanonicalSound, Sound, f32_to_fixed};

use crate::resample::resample;

/// Convert a sound to the playback engine's required input format:
/// resampled to `rate`, clipped to [-1, +1), 16-bit signed fixed point,
/// stereo.
///
/// Resampling runs first, in floating point, so the anti-aliasing filter
/// never operates on already-quantized data.
pub fn canonicalize(s: &Sound, rate: u32) -> CanonicalSound {
    let resampled = if s.samplerate() == rate {
        s.clone()
    } else {
        resample(s, rate)
    };
    let stereo = resampled.to_stereo();
    let fixed: Vec<i16> = stereo.to_float_vec().into_iter().map(f32_to_fixed).collect();
    // The buffer came from a stereo sound, so frames always tile.
    CanonicalSound::from_interleaved(fixed, rate).unwrap_or_else(|_| CanonicalSound::silent(rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tone;
    use resona_core::{Freq, Time, fixed_to_f32};

    #[test]
    fn test_canonical_tone_shape() {
        let s = tone(Freq::hz(1000.0), Time::secs(1.0), 44100);
        let c = canonicalize(&s, 44100);
        assert_eq!(c.nframes(), 44100);
        assert_eq!(c.samplerate(), 44100);
        assert_eq!(c.to_sound().nchannels(), 2);
        assert!((c.duration().as_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_canonical_clips_overrange() {
        let s = Sound::from_mono(vec![2.0, -2.0, 0.5], 44100);
        let c = canonicalize(&s, 44100);
        let data = c.data();
        assert_eq!(data[0], i16::MAX);
        assert_eq!(data[2], i16::MIN);
        assert!((fixed_to_f32(data[4]) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_canonical_resamples() {
        let s = tone(Freq::hz(440.0), Time::ms(500.0), 48000);
        let c = canonicalize(&s, 44100);
        assert_eq!(c.samplerate(), 44100);
        let expected = (s.nframes() * 147).div_ceil(160);
        assert_eq!(c.nframes(), expected);
    }
}
