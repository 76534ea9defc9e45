//! Combining sounds: sums, products, stereo assembly, and crossfades.

use resona_core::{IntoTime, Result, Sound, SoundError, Time};

use crate::envelope::{rampoff, rampon};

/// Default crossfade overlap for [`fadeto`].
pub const DEFAULT_CROSSFADE: Time = Time::ms(50.0);

fn check_rates<'a>(sounds: &[&'a Sound]) -> Result<&'a Sound> {
    let first = sounds
        .first()
        .ok_or_else(|| SoundError::Shape("cannot combine zero sounds".into()))?;
    for s in &sounds[1..] {
        if s.samplerate() != first.samplerate() {
            return Err(SoundError::RateMismatch {
                found: s.samplerate(),
                required: first.samplerate(),
            });
        }
    }
    Ok(first)
}

/// Element-wise reduction over sounds padded to the longest input.
fn reduce(sounds: &[&Sound], pad: f32, op: impl Fn(f32, f32) -> f32) -> Result<Sound> {
    let first = check_rates(sounds)?;
    let rate = first.samplerate();
    let stereo = sounds.iter().any(|s| s.is_stereo());
    let channels: u16 = if stereo { 2 } else { 1 };
    let frames = sounds.iter().map(|s| s.nframes()).max().unwrap_or(0);

    // The pad value is the identity of the reduction, so shorter inputs
    // simply stop contributing past their end.
    let mut out = vec![pad; frames * usize::from(channels)];
    for s in sounds {
        let s = if stereo && !s.is_stereo() {
            s.to_stereo()
        } else {
            (*s).clone()
        };
        let data = s.to_float_vec();
        for (o, x) in out.iter_mut().zip(data) {
            *o = op(*o, x);
        }
    }
    Sound::from_interleaved(out, rate, channels)
}

/// Sum sounds element-wise, zero-padding shorter inputs to the longest.
///
/// Commutative and associative; the result may exceed [-1, +1] and is
/// clipped only at canonicalization.
pub fn mix(sounds: &[&Sound]) -> Result<Sound> {
    reduce(sounds, 0.0, |a, b| a + b)
}

/// Multiply sounds element-wise, one-padding shorter inputs to the longest.
pub fn mult(sounds: &[&Sound]) -> Result<Sound> {
    reduce(sounds, 1.0, |a, b| a * b)
}

/// Assemble a stereo sound from a left and a right source of equal rate and
/// length.
///
/// The left channel of `left` and the right channel of `right` are taken,
/// so `leftright(s.left(), s.right())` reconstructs a stereo `s`, and two
/// mono sources land on their respective sides.
pub fn leftright(left: &Sound, right: &Sound) -> Result<Sound> {
    if left.samplerate() != right.samplerate() {
        return Err(SoundError::RateMismatch {
            found: right.samplerate(),
            required: left.samplerate(),
        });
    }
    if left.nframes() != right.nframes() {
        return Err(SoundError::Shape(format!(
            "left has {} frames but right has {}",
            left.nframes(),
            right.nframes()
        )));
    }
    let l = left.channel_f32(0);
    let r = right.channel_f32(1);
    let mut out = Vec::with_capacity(l.len() * 2);
    for (a, b) in l.into_iter().zip(r) {
        out.push(a);
        out.push(b);
    }
    Sound::from_interleaved(out, left.samplerate(), 2)
}

/// Concatenate two sounds in time.
///
/// Inputs must share a sample rate; if either is stereo the result is
/// stereo with mono input broadcast.
pub fn concat(a: &Sound, b: &Sound) -> Result<Sound> {
    if a.samplerate() != b.samplerate() {
        return Err(SoundError::RateMismatch {
            found: b.samplerate(),
            required: a.samplerate(),
        });
    }
    let stereo = a.is_stereo() || b.is_stereo();
    let (a, b) = if stereo {
        (a.to_stereo(), b.to_stereo())
    } else {
        (a.clone(), b.clone())
    };
    let mut out = a.to_float_vec();
    out.extend(b.to_float_vec());
    Sound::from_interleaved(out, a.samplerate(), if stereo { 2 } else { 1 })
}

/// Crossfade from `a` into `b` over `overlap`.
///
/// The tail of `a` is ramped off while the head of `b`, delayed by
/// `dur(a) − overlap`, is ramped on; total duration is
/// `dur(a) + dur(b) − overlap`.
pub fn fadeto(a: &Sound, b: &Sound, overlap: impl IntoTime) -> Result<Sound> {
    let overlap = overlap.into_time();
    if a.samplerate() != b.samplerate() {
        return Err(SoundError::RateMismatch {
            found: b.samplerate(),
            required: a.samplerate(),
        });
    }
    let rate = a.samplerate();
    let pad_frames = a.nframes().saturating_sub(overlap.frames(rate));

    let faded_a = rampoff(a, overlap)?;
    let faded_b = rampon(b, overlap)?;
    let delay = Sound::from_mono(vec![0.0; pad_frames], rate);
    let delayed_b = concat(&delay, &faded_b)?;
    mix(&[&faded_a, &delayed_b])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{silence, tone};
    use resona_core::{Freq, Time};

    #[test]
    fn test_mix_with_silence_is_identity() {
        let s = tone(Freq::hz(440.0), Time::ms(100.0), 44100);
        let z = silence(s.duration(), 44100);
        let m = mix(&[&s, &z]).unwrap();
        assert_eq!(m.channel_f32(0), s.channel_f32(0));
    }

    #[test]
    fn test_mix_zero_pads_to_longest() {
        let s = tone(Freq::hz(440.0), Time::ms(100.0), 44100);
        let z = silence(Time::ms(200.0), 44100);
        let m = mix(&[&s, &z]).unwrap();
        assert_eq!(m.nframes(), Time::ms(200.0).frames(44100));
        let data = m.channel_f32(0);
        let orig = s.channel_f32(0);
        assert_eq!(&data[..orig.len()], &orig[..]);
        assert!(data[orig.len()..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_mult_one_pads() {
        let a = Sound::from_mono(vec![0.5; 4], 44100);
        let b = Sound::from_mono(vec![0.5; 2], 44100);
        let m = mult(&[&a, &b]).unwrap();
        assert_eq!(m.channel_f32(0), vec![0.25, 0.25, 0.5, 0.5]);
    }

    #[test]
    fn test_mix_rejects_rate_mismatch() {
        let a = silence(Time::ms(10.0), 44100);
        let b = silence(Time::ms(10.0), 48000);
        assert!(matches!(
            mix(&[&a, &b]),
            Err(SoundError::RateMismatch { .. })
        ));
    }

    #[test]
    fn test_mix_broadcasts_mono_against_stereo() {
        let mono = Sound::from_mono(vec![0.5, 0.5], 44100);
        let stereo = Sound::from_interleaved(vec![0.1, 0.2, 0.1, 0.2], 44100, 2).unwrap();
        let m = mix(&[&mono, &stereo]).unwrap();
        assert!(m.is_stereo());
        assert_eq!(m.channel_f32(0), vec![0.6, 0.6]);
        assert_eq!(m.channel_f32(1), vec![0.7, 0.7]);
    }

    #[test]
    fn test_leftright_reconstructs_stereo() {
        let s = Sound::from_interleaved(vec![0.1, 0.2, 0.3, 0.4], 44100, 2).unwrap();
        let back = leftright(&s.left(), &s.right()).unwrap();
        assert_eq!(back, s.to_stereo());
    }

    #[test]
    fn test_leftright_mono_right_silent() {
        let m = Sound::from_mono(vec![0.5, 0.25], 44100);
        let z = silence(m.duration(), 44100);
        let s = leftright(&m, &z).unwrap();
        assert_eq!(s.channel_f32(0), vec![0.5, 0.25]);
        assert_eq!(s.channel_f32(1), vec![0.0, 0.0]);
    }

    #[test]
    fn test_leftright_length_mismatch() {
        let a = silence(Time::ms(10.0), 44100);
        let b = silence(Time::ms(20.0), 44100);
        assert!(leftright(&a, &b).is_err());
    }

    #[test]
    fn test_concat_lengths_add() {
        let a = silence(Time::ms(10.0), 44100);
        let b = silence(Time::ms(20.0), 44100);
        let c = concat(&a, &b).unwrap();
        assert_eq!(c.nframes(), a.nframes() + b.nframes());
    }

    #[test]
    fn test_fadeto_duration() {
        // Two 1 s sounds crossfaded over 50 ms: 1.95 s total.
        let a = tone(Freq::hz(440.0), Time::secs(1.0), 44100);
        let b = tone(Freq::hz(880.0), Time::secs(1.0), 44100);
        let f = fadeto(&a, &b, Time::ms(50.0)).unwrap();
        let expected = 2 * 44100 - Time::ms(50.0).frames(44100);
        assert_eq!(f.nframes(), expected);
        assert!((f.duration().as_secs() - 1.95).abs() < 1e-4);
    }

    #[test]
    fn test_fadeto_crossfade_region() {
        let a = Sound::from_mono(vec![1.0; 4410], 44100); // 100 ms DC
        let b = Sound::from_mono(vec![1.0; 4410], 44100);
        let f = fadeto(&a, &b, Time::ms(50.0)).unwrap();
        let data = f.channel_f32(0);
        // Before the overlap: only a, untouched.
        assert_eq!(data[0], 1.0);
        // Inside the overlap the two half-cosine windows sum to ~1.
        let overlap_start = 4410 - Time::ms(50.0).frames(44100);
        for k in overlap_start..4410 {
            assert!((data[k] - 1.0).abs() < 0.02, "dip at {k}: {}", data[k]);
        }
        // After the overlap: only b, untouched.
        assert_eq!(data[f.nframes() - 1], 1.0);
    }
}
