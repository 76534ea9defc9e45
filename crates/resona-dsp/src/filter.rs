//! Butterworth filtering of sound values.
//!
//! An order-N Butterworth response is realized as a cascade of second-order
//! sections (plus one first-order section when N is odd). Each biquad uses
//! the RBJ Audio EQ Cookbook coefficients at the corner frequency with the
//! section's Butterworth Q; the bilinear transform inside the RBJ formulas
//! prewarps every section to the same corner, so the cascade keeps the
//! maximally-flat response.
//!
//! Filtering is forward (causal) only, applied independently per channel.
//! Band filters compose the two one-sided designs: bandpass is a
//! highpass→lowpass cascade, bandstop the parallel sum of a lowpass and a
//! highpass.

use libm::{cosf, expf, sinf};
use resona_core::{IntoFreq, Result, Samples, Sound};

const PI: f32 = core::f32::consts::PI;

/// Default Butterworth order for the convenience of experiment scripts.
pub const DEFAULT_FILTER_ORDER: usize = 5;

/// Direct Form I biquad section.
///
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    fn from_coefficients(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        let a0_inv = 1.0 / a0;
        Biquad {
            b0: b0 * a0_inv,
            b1: b1 * a0_inv,
            b2: b2 * a0_inv,
            a1: a1 * a0_inv,
            a2: a2 * a0_inv,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// RBJ cookbook lowpass section.
    fn lowpass(freq: f32, q: f32, rate: f32) -> Self {
        let w0 = 2.0 * PI * freq / rate;
        let cos_w0 = cosf(w0);
        let alpha = sinf(w0) / (2.0 * q);
        Self::from_coefficients(
            (1.0 - cos_w0) / 2.0,
            1.0 - cos_w0,
            (1.0 - cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        )
    }

    /// RBJ cookbook highpass section.
    fn highpass(freq: f32, q: f32, rate: f32) -> Self {
        let w0 = 2.0 * PI * freq / rate;
        let cos_w0 = cosf(w0);
        let alpha = sinf(w0) / (2.0 * q);
        Self::from_coefficients(
            (1.0 + cos_w0) / 2.0,
            -(1.0 + cos_w0),
            (1.0 + cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        )
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }
}

/// First-order section for odd filter orders.
///
/// Lowpass: `y[n] = x[n] + coeff * (y[n-1] - x[n])` with
/// `coeff = exp(-2π·freq/rate)`; highpass is its complement `x - lp(x)`.
#[derive(Debug, Clone)]
struct OnePole {
    coeff: f32,
    state: f32,
    highpass: bool,
}

impl OnePole {
    fn new(freq: f32, rate: f32, highpass: bool) -> Self {
        OnePole {
            coeff: expf(-2.0 * PI * freq / rate),
            state: 0.0,
            highpass,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.state = input + self.coeff * (self.state - input);
        if self.highpass {
            input - self.state
        } else {
            self.state
        }
    }
}

/// One channel's worth of cascade state.
#[derive(Debug, Clone)]
struct Cascade {
    first_order: Option<OnePole>,
    biquads: Vec<Biquad>,
}

impl Cascade {
    /// Build an order-`order` Butterworth cascade at `freq`.
    ///
    /// Section Qs follow the Butterworth pole angles: for even order,
    /// `Q_k = 1 / (2·cos(π(2k−1)/(2n)))`; for odd order the real pole
    /// becomes a first-order section and the pairs use `Q_k = 1/(2·cos(kπ/n))`.
    fn butterworth(order: usize, freq: f32, rate: f32, highpass: bool) -> Self {
        let n = order.max(1);
        let make = if highpass {
            Biquad::highpass
        } else {
            Biquad::lowpass
        };
        let mut biquads = Vec::with_capacity(n / 2);
        if n % 2 == 0 {
            for k in 1..=n / 2 {
                let theta = PI * (2 * k - 1) as f32 / (2 * n) as f32;
                biquads.push(make(freq, 1.0 / (2.0 * cosf(theta)), rate));
            }
            Cascade {
                first_order: None,
                biquads,
            }
        } else {
            for k in 1..=(n - 1) / 2 {
                let theta = PI * k as f32 / n as f32;
                biquads.push(make(freq, 1.0 / (2.0 * cosf(theta)), rate));
            }
            Cascade {
                first_order: Some(OnePole::new(freq, rate, highpass)),
                biquads,
            }
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut x = input;
        if let Some(fo) = self.first_order.as_mut() {
            x = fo.process(x);
        }
        for bq in &mut self.biquads {
            x = bq.process(x);
        }
        x
    }
}

/// Clamp a corner frequency into the filterable band, like any sane filter
/// front panel does.
fn clamp_corner(freq: f32, rate: u32) -> f32 {
    freq.clamp(1.0, rate as f32 * 0.49)
}

fn apply_per_channel(s: &Sound, mut make: impl FnMut() -> Cascade) -> Sound {
    let channels = usize::from(s.nchannels());
    let frames = s.nframes();
    let mut out = vec![0.0f32; frames * channels];
    for ch in 0..channels {
        let mut cascade = make();
        let data = s.channel_f32(ch);
        for (frame, &x) in data.iter().enumerate() {
            out[frame * channels + ch] = cascade.process(x);
        }
    }
    rebuild(s, out)
}

fn rebuild(s: &Sound, samples: Vec<f32>) -> Sound {
    // Same shape as the input; construction cannot fail.
    Sound::from_interleaved(samples, s.samplerate(), s.nchannels())
        .unwrap_or_else(|_| Sound::from_mono(Vec::new(), s.samplerate()))
}

/// Butterworth lowpass at `cutoff`.
pub fn lowpass(s: &Sound, cutoff: impl IntoFreq, order: usize) -> Result<Sound> {
    let rate = s.samplerate();
    let fc = clamp_corner(cutoff.into_freq().as_hz() as f32, rate);
    Ok(apply_per_channel(s, || {
        Cascade::butterworth(order, fc, rate as f32, false)
    }))
}

/// Butterworth highpass at `cutoff`.
pub fn highpass(s: &Sound, cutoff: impl IntoFreq, order: usize) -> Result<Sound> {
    let rate = s.samplerate();
    let fc = clamp_corner(cutoff.into_freq().as_hz() as f32, rate);
    Ok(apply_per_channel(s, || {
        Cascade::butterworth(order, fc, rate as f32, true)
    }))
}

/// Butterworth bandpass between `low` and `high`: a highpass at the lower
/// corner cascaded into a lowpass at the upper corner.
pub fn bandpass(s: &Sound, low: impl IntoFreq, high: impl IntoFreq, order: usize) -> Result<Sound> {
    let rate = s.samplerate();
    let lo = clamp_corner(low.into_freq().as_hz() as f32, rate);
    let hi = clamp_corner(high.into_freq().as_hz() as f32, rate);
    let passed = apply_per_channel(s, || Cascade::butterworth(order, lo, rate as f32, true));
    Ok(apply_per_channel(&passed, || {
        Cascade::butterworth(order, hi, rate as f32, false)
    }))
}

/// Butterworth bandstop between `low` and `high`: the parallel sum of a
/// lowpass at the lower corner and a highpass at the upper corner.
pub fn bandstop(s: &Sound, low: impl IntoFreq, high: impl IntoFreq, order: usize) -> Result<Sound> {
    let rate = s.samplerate();
    let lo = clamp_corner(low.into_freq().as_hz() as f32, rate);
    let hi = clamp_corner(high.into_freq().as_hz() as f32, rate);
    let lowed = apply_per_channel(s, || Cascade::butterworth(order, lo, rate as f32, false));
    let highed = apply_per_channel(s, || Cascade::butterworth(order, hi, rate as f32, true));
    let channels = usize::from(s.nchannels());
    let mut out = lowed.to_float_vec();
    match highed.samples() {
        Samples::Float(v) => {
            for (o, &x) in out.iter_mut().zip(v.iter()) {
                *o += x;
            }
        }
        Samples::Fixed(_) => {
            let v = highed.to_float_vec();
            for (o, x) in out.iter_mut().zip(v) {
                *o += x;
            }
        }
    }
    Sound::from_interleaved(out, rate, channels as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tone;
    use resona_core::{Freq, Time};

    fn mean_abs(data: &[f32]) -> f32 {
        data.iter().map(|x| x.abs()).sum::<f32>() / data.len() as f32
    }

    #[test]
    fn test_lowpass_passes_low_attenuates_high() {
        let low = tone(Freq::hz(200.0), Time::secs(0.5), 44100);
        let high = tone(Freq::hz(8000.0), Time::secs(0.5), 44100);

        let low_out = lowpass(&low, Freq::hz(1000.0), 5).unwrap();
        let high_out = lowpass(&high, Freq::hz(1000.0), 5).unwrap();

        // Skip the transient head before measuring.
        let lo = mean_abs(&low_out.channel_f32(0)[4410..]);
        let hi = mean_abs(&high_out.channel_f32(0)[4410..]);
        assert!(lo > 0.5, "passband level too low: {lo}");
        assert!(hi < 0.01, "stopband leak: {hi}");
    }

    #[test]
    fn test_highpass_is_complement() {
        let low = tone(Freq::hz(100.0), Time::secs(0.5), 44100);
        let high = tone(Freq::hz(5000.0), Time::secs(0.5), 44100);

        let low_out = highpass(&low, Freq::hz(1000.0), 5).unwrap();
        let high_out = highpass(&high, Freq::hz(1000.0), 5).unwrap();

        let lo = mean_abs(&low_out.channel_f32(0)[4410..]);
        let hi = mean_abs(&high_out.channel_f32(0)[4410..]);
        assert!(lo < 0.01, "stopband leak: {lo}");
        assert!(hi > 0.5, "passband level too low: {hi}");
    }

    #[test]
    fn test_bandpass_selects_band() {
        let inside = tone(Freq::hz(1000.0), Time::secs(0.5), 44100);
        let below = tone(Freq::hz(100.0), Time::secs(0.5), 44100);
        let above = tone(Freq::hz(10000.0), Time::secs(0.5), 44100);

        let f = |s| bandpass(s, Freq::hz(500.0), Freq::hz(2000.0), 5).unwrap();
        assert!(mean_abs(&f(&inside).channel_f32(0)[4410..]) > 0.4);
        assert!(mean_abs(&f(&below).channel_f32(0)[4410..]) < 0.02);
        assert!(mean_abs(&f(&above).channel_f32(0)[4410..]) < 0.02);
    }

    #[test]
    fn test_bandstop_rejects_band() {
        let inside = tone(Freq::hz(1000.0), Time::secs(0.5), 44100);
        let below = tone(Freq::hz(100.0), Time::secs(0.5), 44100);

        let f = |s| bandstop(s, Freq::hz(500.0), Freq::hz(2000.0), 5).unwrap();
        assert!(mean_abs(&f(&inside).channel_f32(0)[4410..]) < 0.05);
        assert!(mean_abs(&f(&below).channel_f32(0)[4410..]) > 0.4);
    }

    #[test]
    fn test_stereo_channels_filtered_independently() {
        let s = tone(Freq::hz(200.0), Time::ms(100.0), 44100).to_stereo();
        let out = lowpass(&s, Freq::hz(1000.0), 4).unwrap();
        assert!(out.is_stereo());
        assert_eq!(out.channel_f32(0), out.channel_f32(1));
    }

    #[test]
    fn test_even_and_odd_orders() {
        let s = tone(Freq::hz(100.0), Time::ms(50.0), 44100);
        for order in 1..=6 {
            let out = lowpass(&s, Freq::hz(2000.0), order).unwrap();
            assert_eq!(out.nframes(), s.nframes());
            assert!(out.channel_f32(0).iter().all(|x| x.is_finite()));
        }
    }
}
