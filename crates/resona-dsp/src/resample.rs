//! Rational sample-rate conversion of sound values.
//!
//! Resampling from R to R' runs a polyphase windowed-sinc lowpass (Blackman
//! window) at the reduced ratio P/Q = R'/R. The polyphase decomposition
//! computes only the output samples actually needed, so no explicit
//! zero-insertion buffer exists.
//!
//! Downward conversions lose the band above R'/2; that loss is reported as
//! a warning, not an error, because deliberately downsampling a stimulus is
//! routine.
//!
//! Reference: P. P. Vaidyanathan, *Multirate Systems and Filter Banks*,
//! Prentice Hall, 1993, Chapter 4.

use std::f32::consts::PI;

use resona_core::Sound;

/// Windowed-sinc lowpass FIR prototype, normalized to unity DC gain.
///
/// `cutoff` is normalized to Nyquist (1.0 = fs/2). Blackman window:
/// `w[n] = 0.42 - 0.5·cos(2πn/M) + 0.08·cos(4πn/M)`.
fn design_lowpass(num_taps: usize, cutoff: f32) -> Vec<f32> {
    if num_taps == 0 {
        return Vec::new();
    }
    let m = num_taps - 1;
    let mut coeffs = Vec::with_capacity(num_taps);
    for n in 0..num_taps {
        let x = n as f32 - m as f32 / 2.0;
        let sinc = if x.abs() < 1e-7 {
            cutoff
        } else {
            (PI * cutoff * x).sin() / (PI * x)
        };
        let window = if m == 0 {
            1.0
        } else {
            let phase = 2.0 * PI * n as f32 / m as f32;
            0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
        };
        coeffs.push(sinc * window);
    }
    let sum: f32 = coeffs.iter().sum();
    if sum.abs() > 1e-10 {
        for c in coeffs.iter_mut() {
            *c /= sum;
        }
    }
    coeffs
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Resample one channel by the reduced ratio p/q using polyphase
/// decomposition of the prototype filter.
fn resample_channel(signal: &[f32], p: usize, q: usize) -> Vec<f32> {
    if p == 1 && q == 1 {
        return signal.to_vec();
    }

    let num_taps = 4 * p.max(q) * 10 + 1;
    // Cutoff at min(1/P, 1/Q) with a 10% guard band.
    let cutoff = 0.9 / p.max(q) as f32;
    let prototype = design_lowpass(num_taps, cutoff);

    let out_len = (signal.len() * p).div_ceil(q);
    let taps_per_phase = num_taps.div_ceil(p);

    // Sub-filter k holds prototype taps k, k+P, k+2P, ...
    let mut polyphase = vec![vec![0.0f32; taps_per_phase]; p];
    for (tap_idx, &coeff) in prototype.iter().enumerate() {
        polyphase[tap_idx % p][tap_idx / p] = coeff;
    }

    let mut output = Vec::with_capacity(out_len);
    for m in 0..out_len {
        let full_idx = m * q; // position in the P-upsampled sequence
        let n = full_idx / p; // input frame index
        let k = full_idx % p; // polyphase branch

        let mut acc = 0.0f32;
        for (i, &coeff) in polyphase[k].iter().enumerate() {
            if n >= i && (n - i) < signal.len() {
                acc += coeff * signal[n - i];
            }
        }
        // Scale by P so a unity ratio is an identity.
        output.push(acc * p as f32);
    }
    output
}

/// Return a new sound at `new_rate`.
///
/// The envelope of the signal is preserved over the shared passband; when
/// `new_rate` is below the current rate, content above `new_rate/2` is
/// removed by the anti-aliasing filter and a warning is logged naming the
/// lost band.
pub fn resample(s: &Sound, new_rate: u32) -> Sound {
    let old_rate = s.samplerate();
    if new_rate == old_rate {
        return s.clone();
    }
    if new_rate < old_rate {
        tracing::warn!(
            from = old_rate,
            to = new_rate,
            lost_above_hz = new_rate / 2,
            "downsampling discards content above the new Nyquist"
        );
    }

    let g = gcd(new_rate as usize, old_rate as usize);
    let p = new_rate as usize / g;
    let q = old_rate as usize / g;

    let channels = usize::from(s.nchannels());
    let mut per_channel: Vec<Vec<f32>> = (0..channels)
        .map(|ch| resample_channel(&s.channel_f32(ch), p, q))
        .collect();

    let frames = per_channel.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(frames * channels);
    for frame in 0..frames {
        for chan in per_channel.iter_mut() {
            out.push(chan[frame]);
        }
    }
    Sound::from_interleaved(out, new_rate, channels as u16)
        .unwrap_or_else(|_| Sound::from_mono(Vec::new(), new_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tone;
    use resona_core::{Freq, Time};

    /// Amplitude of a single frequency bin via direct DFT.
    fn spectral_peak_at(signal: &[f32], freq_hz: f32, sample_rate: f32) -> f32 {
        let n = signal.len();
        let mut re = 0.0f32;
        let mut im = 0.0f32;
        for (i, &s) in signal.iter().enumerate() {
            let phase = 2.0 * PI * freq_hz * i as f32 / sample_rate;
            re += s * phase.cos();
            im += s * phase.sin();
        }
        (re * re + im * im).sqrt() / n as f32
    }

    #[test]
    fn test_design_lowpass_symmetric_unity_dc() {
        let coeffs = design_lowpass(65, 0.4);
        let n = coeffs.len();
        for i in 0..n / 2 {
            assert!((coeffs[i] - coeffs[n - 1 - i]).abs() < 1e-6);
        }
        let sum: f32 = coeffs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let s = tone(Freq::hz(440.0), Time::ms(100.0), 44100);
        let r = resample(&s, 44100);
        assert_eq!(r, s);
    }

    #[test]
    fn test_resample_44100_to_48000_preserves_tone() {
        let s = tone(Freq::hz(1000.0), Time::secs(1.0), 44100);
        let r = resample(&s, 48000);
        assert_eq!(r.samplerate(), 48000);

        let expected = (44100usize * 160).div_ceil(147);
        assert_eq!(r.nframes(), expected);

        let peak = spectral_peak_at(&r.channel_f32(0)[4800..], 1000.0, 48000.0);
        assert!(peak > 0.2, "1 kHz tone lost in conversion, peak={peak}");
    }

    #[test]
    fn test_downsample_rejects_above_new_nyquist() {
        let safe = tone(Freq::hz(2000.0), Time::ms(100.0), 48000);
        let alias = tone(Freq::hz(10000.0), Time::ms(100.0), 48000);

        let safe_out = resample(&safe, 12000);
        let alias_out = resample(&alias, 12000);

        let peak_safe = spectral_peak_at(&safe_out.channel_f32(0)[20..], 2000.0, 12000.0);
        let mean_alias: f32 = alias_out.channel_f32(0).iter().map(|x| x.abs()).sum::<f32>()
            / alias_out.nframes() as f32;

        assert!(peak_safe > 0.2, "2 kHz should survive, peak={peak_safe}");
        assert!(mean_alias < 0.05, "10 kHz should be rejected, mean={mean_alias}");
    }

    #[test]
    fn test_resample_stereo_keeps_channels() {
        let s = tone(Freq::hz(500.0), Time::ms(100.0), 44100).to_stereo();
        let r = resample(&s, 22050);
        assert!(r.is_stereo());
        assert_eq!(r.channel_f32(0), r.channel_f32(1));
    }
}
