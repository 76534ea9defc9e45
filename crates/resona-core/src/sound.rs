//! The sound value model: immutable PCM tagged with rate and channels.
//!
//! A [`Sound`] is a rank-1 (mono) or rank-2 (stereo) array of samples stored
//! interleaved, plus an invariant sample rate. Two element types exist:
//! floating point in [-1, +1] and the canonical 16-bit signed fixed-point in
//! [-1, +1) that the playback engine consumes. Values never silently change
//! rate or channel count; those transformations are explicit operations.

use std::sync::Arc;

use crate::error::SoundError;
use crate::quantity::{IntoTime, Time};
use crate::Result;

/// Full-scale divisor of the canonical fixed-point format.
pub const FIXED_SCALE: f32 = 32768.0;

/// Convert a float sample to canonical fixed point, clipping to [-1, +1).
#[inline]
pub fn f32_to_fixed(x: f32) -> i16 {
    (x * FIXED_SCALE).clamp(-32768.0, 32767.0) as i16
}

/// Convert a canonical fixed-point sample back to float.
#[inline]
pub fn fixed_to_f32(x: i16) -> f32 {
    f32::from(x) / FIXED_SCALE
}

/// Interleaved sample storage, tagged by element type.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// Floating-point samples in [-1, +1].
    Float(Vec<f32>),
    /// Canonical 16-bit signed fixed-point samples.
    Fixed(Vec<i16>),
}

impl Samples {
    /// Total sample count across all channels.
    pub fn len(&self) -> usize {
        match self {
            Samples::Float(v) => v.len(),
            Samples::Fixed(v) => v.len(),
        }
    }

    /// True when no samples are present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at a flat (interleaved) index, as float.
    #[inline]
    pub fn get_f32(&self, idx: usize) -> f32 {
        match self {
            Samples::Float(v) => v[idx],
            Samples::Fixed(v) => fixed_to_f32(v[idx]),
        }
    }
}

/// Sample data as handed over by loaders and foreign interfaces.
///
/// Floating-point variants are accepted directly; the canonical fixed-point
/// format passes through; plain integers are rejected with
/// [`SoundError::Type`] because their full-scale value is ambiguous.
#[derive(Debug, Clone)]
pub enum RawSamples {
    /// 32-bit floats in [-1, +1].
    F32(Vec<f32>),
    /// 64-bit floats in [-1, +1]; narrowed on construction.
    F64(Vec<f64>),
    /// Canonical fixed-point samples.
    Fixed(Vec<i16>),
    /// Un-normalized integers. Always rejected.
    Int(Vec<i32>),
}

/// An immutable PCM buffer with an invariant sample rate and channel count.
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    samples: Samples,
    rate: u32,
    channels: u16,
}

impl Sound {
    /// Construct from raw loader data, validating shape and element type.
    pub fn from_raw(raw: RawSamples, rate: u32, channels: u16) -> Result<Self> {
        let samples = match raw {
            RawSamples::F32(v) => Samples::Float(v),
            RawSamples::F64(v) => Samples::Float(v.into_iter().map(|x| x as f32).collect()),
            RawSamples::Fixed(v) => Samples::Fixed(v),
            RawSamples::Int(_) => return Err(SoundError::Type),
        };
        Self::from_samples(samples, rate, channels)
    }

    /// Construct from interleaved float samples.
    pub fn from_interleaved(samples: Vec<f32>, rate: u32, channels: u16) -> Result<Self> {
        Self::from_samples(Samples::Float(samples), rate, channels)
    }

    /// Construct from interleaved canonical fixed-point samples.
    pub fn from_fixed(samples: Vec<i16>, rate: u32, channels: u16) -> Result<Self> {
        Self::from_samples(Samples::Fixed(samples), rate, channels)
    }

    /// Construct a mono sound from float samples. Infallible: one channel
    /// always tiles.
    pub fn from_mono(samples: Vec<f32>, rate: u32) -> Self {
        Sound {
            samples: Samples::Float(samples),
            rate,
            channels: 1,
        }
    }

    fn from_samples(samples: Samples, rate: u32, channels: u16) -> Result<Self> {
        if !(1..=2).contains(&channels) {
            return Err(SoundError::Shape(format!(
                "{channels} channels requested, only mono and stereo are supported"
            )));
        }
        if rate == 0 {
            return Err(SoundError::Shape("sample rate must be positive".into()));
        }
        if samples.len() % usize::from(channels) != 0 {
            return Err(SoundError::Shape(format!(
                "{} samples do not tile into {channels}-channel frames",
                samples.len()
            )));
        }
        Ok(Sound {
            samples,
            rate,
            channels,
        })
    }

    /// The sample rate in Hz.
    pub fn samplerate(&self) -> u32 {
        self.rate
    }

    /// The channel count (1 or 2).
    pub fn nchannels(&self) -> u16 {
        self.channels
    }

    /// The number of sample frames.
    pub fn nframes(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    /// True when the sound carries two channels.
    pub fn is_stereo(&self) -> bool {
        self.channels == 2
    }

    /// True when no frames are present.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The duration of the sound.
    pub fn duration(&self) -> Time {
        Time::secs(self.nframes() as f64 / f64::from(self.rate))
    }

    /// Access the underlying interleaved samples.
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Interleaved samples converted to float.
    pub fn to_float_vec(&self) -> Vec<f32> {
        match &self.samples {
            Samples::Float(v) => v.clone(),
            Samples::Fixed(v) => v.iter().map(|&x| fixed_to_f32(x)).collect(),
        }
    }

    /// One channel, deinterleaved, as float. Channel 0 is left; for mono
    /// sounds either index returns the single channel.
    pub fn channel_f32(&self, channel: usize) -> Vec<f32> {
        let ch = usize::from(self.channels);
        let sel = if self.channels == 1 { 0 } else { channel.min(1) };
        let mut out = Vec::with_capacity(self.nframes());
        let mut idx = sel;
        let total = self.samples.len();
        while idx < total {
            out.push(self.samples.get_f32(idx));
            idx += ch;
        }
        out
    }

    /// Slice a time interval out of the sound.
    ///
    /// Bounds resolve to frame indices `⌊from·R⌋ .. ⌊to·R⌋`; the result
    /// carries the same rate and channel count. Fails with
    /// [`SoundError::OutOfRange`] when the interval starts before zero or
    /// resolves past the end of the data.
    pub fn slice(&self, range: SampleRange) -> Result<Sound> {
        let frames = self.nframes();
        let (from, to) = range.resolve(self.rate, frames)?;
        let ch = usize::from(self.channels);
        let samples = match &self.samples {
            Samples::Float(v) => Samples::Float(v[from * ch..to * ch].to_vec()),
            Samples::Fixed(v) => Samples::Fixed(v[from * ch..to * ch].to_vec()),
        };
        Ok(Sound {
            samples,
            rate: self.rate,
            channels: self.channels,
        })
    }

    /// The left channel, as a stereo sound with the right channel silenced.
    ///
    /// Mono input is broadcast first, so `left(mono)` carries the mono
    /// signal on the left and silence on the right.
    pub fn left(&self) -> Sound {
        self.select_channel(0)
    }

    /// The right channel, as a stereo sound with the left channel silenced.
    pub fn right(&self) -> Sound {
        self.select_channel(1)
    }

    fn select_channel(&self, keep: usize) -> Sound {
        let frames = self.nframes();
        let ch = usize::from(self.channels);
        let mut out = vec![0.0f32; frames * 2];
        for frame in 0..frames {
            let src = if self.channels == 1 {
                frame
            } else {
                frame * ch + keep
            };
            out[frame * 2 + keep] = self.samples.get_f32(src);
        }
        Sound {
            samples: Samples::Float(out),
            rate: self.rate,
            channels: 2,
        }
    }

    /// Broadcast mono to stereo; stereo passes through unchanged.
    pub fn to_stereo(&self) -> Sound {
        if self.is_stereo() {
            return self.clone();
        }
        let frames = self.nframes();
        let mut out = Vec::with_capacity(frames * 2);
        for frame in 0..frames {
            let x = self.samples.get_f32(frame);
            out.push(x);
            out.push(x);
        }
        Sound {
            samples: Samples::Float(out),
            rate: self.rate,
            channels: 2,
        }
    }

    /// Root-mean-square amplitude across all samples.
    pub fn rms(&self) -> f32 {
        let n = self.samples.len();
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = (0..n)
            .map(|i| {
                let x = f64::from(self.samples.get_f32(i));
                x * x
            })
            .sum();
        ((sum / n as f64) as f32).sqrt()
    }

    /// Whether the sound carries audible energy.
    ///
    /// Used to sanity-check stimuli before a run: an attenuation mistake
    /// that drives the signal to numerical silence shows up here.
    pub fn audible(&self) -> bool {
        self.rms() > 1e-4
    }
}

/// A half-open time interval `[from, to)` for slicing, or `[from, end]` when
/// constructed with [`SampleRange::to_end`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRange {
    from: Time,
    to: Option<Time>,
}

impl SampleRange {
    /// An interval with both bounds given.
    pub fn new(from: impl IntoTime, to: impl IntoTime) -> Self {
        SampleRange {
            from: from.into_time(),
            to: Some(to.into_time()),
        }
    }

    /// An interval running from `from` to the end of the sound.
    pub fn to_end(from: impl IntoTime) -> Self {
        SampleRange {
            from: from.into_time(),
            to: None,
        }
    }

    /// Resolve the bounds to a frame index range, validating against the
    /// available frame count.
    pub fn resolve(&self, rate: u32, frames: usize) -> Result<(usize, usize)> {
        if self.from.is_negative() {
            return Err(SoundError::OutOfRange {
                from: 0,
                to: 0,
                frames,
            });
        }
        let from = self.from.frames(rate);
        let to = match self.to {
            Some(t) if t.is_negative() => {
                return Err(SoundError::OutOfRange { from, to: 0, frames });
            }
            Some(t) => t.frames(rate),
            None => frames,
        };
        if from > to || to > frames {
            return Err(SoundError::OutOfRange { from, to, frames });
        }
        Ok((from, to))
    }
}

/// The engine's native sound format: interleaved stereo 16-bit fixed point
/// at a known rate, behind an `Arc` so playback can share the buffer across
/// the realtime boundary without copying.
#[derive(Debug, Clone)]
pub struct CanonicalSound {
    data: Arc<[i16]>,
    rate: u32,
}

impl CanonicalSound {
    /// Wrap interleaved stereo fixed-point samples.
    pub fn from_interleaved(samples: Vec<i16>, rate: u32) -> Result<Self> {
        if samples.len() % 2 != 0 {
            return Err(SoundError::Shape(format!(
                "{} samples do not tile into stereo frames",
                samples.len()
            )));
        }
        Ok(CanonicalSound {
            data: samples.into(),
            rate,
        })
    }

    /// An empty canonical sound at the given rate.
    pub fn silent(rate: u32) -> Self {
        CanonicalSound {
            data: Vec::new().into(),
            rate,
        }
    }

    /// The sample rate in Hz.
    pub fn samplerate(&self) -> u32 {
        self.rate
    }

    /// The number of stereo frames.
    pub fn nframes(&self) -> usize {
        self.data.len() / 2
    }

    /// The duration of the sound.
    pub fn duration(&self) -> Time {
        Time::secs(self.nframes() as f64 / f64::from(self.rate))
    }

    /// The shared interleaved sample buffer.
    pub fn data(&self) -> &Arc<[i16]> {
        &self.data
    }

    /// View as a general [`Sound`] value (copies the samples).
    pub fn to_sound(&self) -> Sound {
        Sound {
            samples: Samples::Fixed(self.data.to_vec()),
            rate: self.rate,
            channels: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Time;

    fn ramp_mono(n: usize, rate: u32) -> Sound {
        Sound::from_mono((0..n).map(|k| k as f32 / n as f32).collect(), rate)
    }

    #[test]
    fn test_construct_rejects_bad_shape() {
        assert!(matches!(
            Sound::from_interleaved(vec![0.0; 3], 44100, 2),
            Err(SoundError::Shape(_))
        ));
        assert!(matches!(
            Sound::from_interleaved(vec![0.0; 4], 44100, 3),
            Err(SoundError::Shape(_))
        ));
        assert!(matches!(
            Sound::from_interleaved(vec![0.0; 4], 0, 2),
            Err(SoundError::Shape(_))
        ));
    }

    #[test]
    fn test_construct_rejects_integers() {
        assert!(matches!(
            Sound::from_raw(RawSamples::Int(vec![0, 1, 2, 3]), 44100, 1),
            Err(SoundError::Type)
        ));
    }

    #[test]
    fn test_accessors() {
        let s = Sound::from_interleaved(vec![0.0; 8], 44100, 2).unwrap();
        assert_eq!(s.nframes(), 4);
        assert_eq!(s.nchannels(), 2);
        assert_eq!(s.samplerate(), 44100);
        assert!((s.duration().as_secs() - 4.0 / 44100.0).abs() < 1e-12);
    }

    #[test]
    fn test_slice_time_bounds() {
        let s = ramp_mono(1000, 1000); // one second, one sample per ms
        let mid = s
            .slice(SampleRange::new(Time::ms(100.0), Time::ms(300.0)))
            .unwrap();
        assert_eq!(mid.nframes(), 200);
        assert!((mid.channel_f32(0)[0] - 0.1).abs() < 1e-6);

        let tail = s.slice(SampleRange::to_end(Time::ms(900.0))).unwrap();
        assert_eq!(tail.nframes(), 100);
    }

    #[test]
    fn test_slice_out_of_range() {
        let s = ramp_mono(1000, 1000);
        assert!(matches!(
            s.slice(SampleRange::new(Time::secs(-0.1), Time::secs(0.5))),
            Err(SoundError::OutOfRange { .. })
        ));
        assert!(matches!(
            s.slice(SampleRange::new(Time::secs(0.5), Time::secs(1.5))),
            Err(SoundError::OutOfRange { .. })
        ));
        assert!(matches!(
            s.slice(SampleRange::new(Time::secs(0.8), Time::secs(0.2))),
            Err(SoundError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_left_of_mono_broadcasts() {
        let s = Sound::from_mono(vec![0.5, 0.25], 44100);
        let l = s.left();
        assert!(l.is_stereo());
        assert_eq!(l.channel_f32(0), vec![0.5, 0.25]);
        assert_eq!(l.channel_f32(1), vec![0.0, 0.0]);
    }

    #[test]
    fn test_right_of_stereo_silences_left() {
        let s = Sound::from_interleaved(vec![0.1, 0.2, 0.3, 0.4], 44100, 2).unwrap();
        let r = s.right();
        assert_eq!(r.channel_f32(0), vec![0.0, 0.0]);
        assert_eq!(r.channel_f32(1), vec![0.2, 0.4]);
    }

    #[test]
    fn test_to_stereo_broadcast() {
        let s = Sound::from_mono(vec![0.5, -0.5], 44100);
        let st = s.to_stereo();
        assert_eq!(st.channel_f32(0), st.channel_f32(1));
        assert_eq!(st.nframes(), 2);
    }

    #[test]
    fn test_fixed_float_round_trip() {
        for &x in &[-1.0f32, -0.5, 0.0, 0.5, 0.999] {
            let back = fixed_to_f32(f32_to_fixed(x));
            assert!((back - x).abs() < 1.0 / FIXED_SCALE, "{x} -> {back}");
        }
        // Out-of-range values clip rather than wrap.
        assert_eq!(f32_to_fixed(2.0), i16::MAX);
        assert_eq!(f32_to_fixed(-2.0), i16::MIN);
    }

    #[test]
    fn test_rms_and_audible() {
        let silent = Sound::from_mono(vec![0.0; 64], 44100);
        assert!(!silent.audible());
        let loud = Sound::from_mono(vec![0.5; 64], 44100);
        assert!((loud.rms() - 0.5).abs() < 1e-6);
        assert!(loud.audible());
    }

    #[test]
    fn test_canonical_shape() {
        assert!(CanonicalSound::from_interleaved(vec![0; 3], 44100).is_err());
        let c = CanonicalSound::from_interleaved(vec![0; 4], 44100).unwrap();
        assert_eq!(c.nframes(), 2);
        assert_eq!(c.to_sound().nchannels(), 2);
    }
}
