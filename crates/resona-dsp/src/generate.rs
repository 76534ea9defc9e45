//! Signal generators: silence, noise, tones, and harmonic complexes.

use libm::sin;
use resona_core::{IntoFreq, IntoTime, Result, Sound, SoundError};

const TWO_PI: f64 = core::f64::consts::TAU;

/// Seedable xorshift PRNG for noise stimuli.
///
/// Noise draws must be reproducible across runs of the same experiment, so
/// the generator takes an explicit seed rather than system entropy.
#[derive(Debug, Clone)]
pub struct NoiseRng {
    state: u32,
}

impl NoiseRng {
    /// Create a generator from a seed. A zero seed is remapped (xorshift has
    /// an all-zero fixed point).
    pub fn new(seed: u32) -> Self {
        NoiseRng {
            state: if seed == 0 { 0x9E3779B9 } else { seed },
        }
    }

    /// Next uniform sample in (-1, +1).
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        (x as i32 as f32) / (i32::MAX as f32)
    }
}

impl Default for NoiseRng {
    fn default() -> Self {
        NoiseRng::new(0x9E3779B9)
    }
}

/// A zero buffer of `⌊len·R⌋` frames (mono).
pub fn silence(len: impl IntoTime, rate: u32) -> Sound {
    Sound::from_mono(vec![0.0; len.into_time().frames(rate)], rate)
}

/// Uniform noise in (-1, +1), mono.
pub fn noise(len: impl IntoTime, rate: u32, rng: &mut NoiseRng) -> Sound {
    let frames = len.into_time().frames(rate);
    Sound::from_mono((0..frames).map(|_| rng.next_sample()).collect(), rate)
}

/// Uniform noise with independent left and right channels drawn from the
/// same generator.
pub fn noise_stereo(len: impl IntoTime, rate: u32, rng: &mut NoiseRng) -> Sound {
    let frames = len.into_time().frames(rate);
    let samples: Vec<f32> = (0..frames * 2).map(|_| rng.next_sample()).collect();
    // Two samples per frame always tile; shape cannot fail here.
    Sound::from_interleaved(samples, rate, 2).unwrap_or_else(|_| silence(0.0, rate))
}

/// A pure sinusoid at `freq`, zero initial phase.
pub fn tone(freq: impl IntoFreq, len: impl IntoTime, rate: u32) -> Sound {
    tone_with_phase(freq, len, rate, 0.0)
}

/// A pure sinusoid with an initial phase offset in radians.
///
/// The phase argument is computed in f64 so long stimuli do not accumulate
/// rounding drift.
pub fn tone_with_phase(freq: impl IntoFreq, len: impl IntoTime, rate: u32, phase: f64) -> Sound {
    let f = freq.into_freq().as_hz();
    let frames = len.into_time().frames(rate);
    let step = TWO_PI * f / f64::from(rate);
    let samples = (0..frames)
        .map(|k| sin(step * k as f64 + phase) as f32)
        .collect();
    Sound::from_mono(samples, rate)
}

/// A harmonic complex: the requested harmonics of `f0` at given amplitudes
/// and phase offsets.
///
/// One cycle of duration `1/f0` is computed by direct summation, then tiled
/// to the full length with a cycle-aligned wrap. Summing each harmonic over
/// the whole stimulus instead would beat against floating-point rounding;
/// tiling one computed cycle keeps every period identical.
///
/// `harmonics` counts from 1 (the fundamental). The three slices must have
/// equal length.
pub fn harmonic_complex(
    f0: impl IntoFreq,
    harmonics: &[u32],
    amps: &[f32],
    phases: &[f64],
    len: impl IntoTime,
    rate: u32,
) -> Result<Sound> {
    let f0 = f0.into_freq().as_hz();
    if harmonics.len() != amps.len() || harmonics.len() != phases.len() {
        return Err(SoundError::Shape(format!(
            "harmonic spec lengths disagree: {} harmonics, {} amplitudes, {} phases",
            harmonics.len(),
            amps.len(),
            phases.len()
        )));
    }
    if harmonics.contains(&0) {
        return Err(SoundError::Shape("harmonic numbers count from 1".into()));
    }
    let cycle_frames = (f64::from(rate) / f0).round();
    if !cycle_frames.is_finite() || cycle_frames < 1.0 {
        return Err(SoundError::Shape(format!(
            "fundamental {f0} Hz has no whole sample at {rate} Hz"
        )));
    }
    let cycle_frames = cycle_frames as usize;

    let mut cycle = vec![0.0f32; cycle_frames];
    for ((&h, &a), &ph) in harmonics.iter().zip(amps).zip(phases) {
        let step = TWO_PI * f64::from(h) / cycle_frames as f64;
        for (j, c) in cycle.iter_mut().enumerate() {
            *c += a * sin(step * j as f64 + ph) as f32;
        }
    }

    let frames = len.into_time().frames(rate);
    let samples = (0..frames).map(|k| cycle[k % cycle_frames]).collect();
    Ok(Sound::from_mono(samples, rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use resona_core::{Freq, Time};

    #[test]
    fn test_silence_length() {
        let s = silence(Time::secs(0.5), 44100);
        assert_eq!(s.nframes(), 22050);
        assert!(s.channel_f32(0).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_tone_duration_and_shape() {
        let s = tone(Freq::hz(1000.0), Time::secs(1.0), 44100);
        assert_eq!(s.nframes(), 44100);
        assert!((s.duration().as_secs() - 1.0).abs() < 1e-12);
        // First sample is sin(0) = 0; a quarter period later it peaks.
        let data = s.channel_f32(0);
        assert_eq!(data[0], 0.0);
        let quarter = (44100.0f64 / 1000.0 / 4.0).round() as usize;
        assert!(data[quarter].abs() > 0.99);
    }

    #[test]
    fn test_tone_phase_offset() {
        let s = tone_with_phase(Freq::hz(100.0), Time::ms(10.0), 44100, core::f64::consts::FRAC_PI_2);
        assert!((s.channel_f32(0)[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_noise_bounded_and_reproducible() {
        let mut rng = NoiseRng::new(42);
        let a = noise(Time::ms(100.0), 44100, &mut rng);
        assert!(a.channel_f32(0).iter().all(|&x| x > -1.0 && x < 1.0));

        let mut rng = NoiseRng::new(42);
        let b = noise(Time::ms(100.0), 44100, &mut rng);
        assert_eq!(a, b);
    }

    #[test]
    fn test_noise_stereo_channels_independent() {
        let mut rng = NoiseRng::new(7);
        let s = noise_stereo(Time::ms(50.0), 44100, &mut rng);
        assert!(s.is_stereo());
        assert_ne!(s.channel_f32(0), s.channel_f32(1));
    }

    #[test]
    fn test_harmonic_complex_tiles_cycle() {
        let s = harmonic_complex(
            Freq::hz(100.0),
            &[1, 2, 3],
            &[1.0, 0.5, 0.25],
            &[0.0, 0.0, 0.0],
            Time::secs(0.1),
            44100,
        )
        .unwrap();
        assert_eq!(s.nframes(), 4410);
        // Cycle length is 441 frames; tiling repeats exactly.
        let data = s.channel_f32(0);
        for k in 0..441 {
            assert_eq!(data[k], data[k + 441]);
        }
    }

    #[test]
    fn test_harmonic_complex_rejects_mismatched_spec() {
        assert!(harmonic_complex(
            Freq::hz(100.0),
            &[1, 2],
            &[1.0],
            &[0.0, 0.0],
            Time::ms(10.0),
            44100
        )
        .is_err());
        assert!(harmonic_complex(
            Freq::hz(100.0),
            &[0],
            &[1.0],
            &[0.0],
            Time::ms(10.0),
            44100
        )
        .is_err());
    }
}
