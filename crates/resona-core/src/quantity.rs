//! Dimensional time and frequency quantities.
//!
//! Stimulus code deals constantly in seconds and Hertz; confusing the two is
//! an easy and expensive mistake in an experiment script. [`Time`] and
//! [`Freq`] are tagged `f64` newtypes whose arithmetic only crosses
//! dimensions in the one legal direction: a time multiplied by a frequency
//! (or a sample rate) yields a dimensionless count.
//!
//! Bare numbers are still accepted at API boundaries through [`IntoTime`] and
//! [`IntoFreq`]; they default to seconds and Hertz and log a warning, so old
//! scripts keep running while the omission is visible in the logs.

use core::fmt;
use core::ops::{Add, Div, Mul, Neg, Sub};

/// A span of time in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Time(f64);

impl Time {
    /// Zero seconds.
    pub const ZERO: Time = Time(0.0);

    /// Construct from seconds.
    pub const fn secs(value: f64) -> Self {
        Time(value)
    }

    /// Construct from milliseconds.
    pub const fn ms(value: f64) -> Self {
        Time(value / 1000.0)
    }

    /// The value in seconds.
    pub const fn as_secs(self) -> f64 {
        self.0
    }

    /// The number of whole sample frames this span covers at `rate` Hz.
    ///
    /// This is the `time × rate → ⌊sample⌋` conversion; fractional frames
    /// are truncated.
    pub fn frames(self, rate: u32) -> usize {
        let n = (self.0 * f64::from(rate)).floor();
        if n <= 0.0 { 0 } else { n as usize }
    }

    /// True when the span is negative.
    pub fn is_negative(self) -> bool {
        self.0 < 0.0
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} s", self.0)
    }
}

/// A frequency in Hertz.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Freq(f64);

impl Freq {
    /// Construct from Hertz.
    pub const fn hz(value: f64) -> Self {
        Freq(value)
    }

    /// Construct from kilohertz.
    pub const fn khz(value: f64) -> Self {
        Freq(value * 1000.0)
    }

    /// The value in Hertz.
    pub const fn as_hz(self) -> f64 {
        self.0
    }

    /// The period of one cycle.
    pub fn period(self) -> Time {
        Time(1.0 / self.0)
    }
}

impl fmt::Display for Freq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

impl Add for Time {
    type Output = Time;
    fn add(self, rhs: Time) -> Time {
        Time(self.0 + rhs.0)
    }
}

impl Sub for Time {
    type Output = Time;
    fn sub(self, rhs: Time) -> Time {
        Time(self.0 - rhs.0)
    }
}

impl Neg for Time {
    type Output = Time;
    fn neg(self) -> Time {
        Time(-self.0)
    }
}

impl Mul<f64> for Time {
    type Output = Time;
    fn mul(self, rhs: f64) -> Time {
        Time(self.0 * rhs)
    }
}

impl Div<f64> for Time {
    type Output = Time;
    fn div(self, rhs: f64) -> Time {
        Time(self.0 / rhs)
    }
}

impl Add for Freq {
    type Output = Freq;
    fn add(self, rhs: Freq) -> Freq {
        Freq(self.0 + rhs.0)
    }
}

impl Sub for Freq {
    type Output = Freq;
    fn sub(self, rhs: Freq) -> Freq {
        Freq(self.0 - rhs.0)
    }
}

impl Mul<f64> for Freq {
    type Output = Freq;
    fn mul(self, rhs: f64) -> Freq {
        Freq(self.0 * rhs)
    }
}

/// `time × frequency → cycles` — the one legal cross-dimension product.
impl Mul<Freq> for Time {
    type Output = f64;
    fn mul(self, rhs: Freq) -> f64 {
        self.0 * rhs.0
    }
}

/// `frequency × time → cycles`.
impl Mul<Time> for Freq {
    type Output = f64;
    fn mul(self, rhs: Time) -> f64 {
        self.0 * rhs.0
    }
}

/// Conversion into [`Time`] for API boundaries.
///
/// Implemented for `Time` itself (identity) and for bare `f64`, which is
/// interpreted as seconds with a logged warning.
pub trait IntoTime {
    /// Convert to a time quantity.
    fn into_time(self) -> Time;
}

impl IntoTime for Time {
    fn into_time(self) -> Time {
        self
    }
}

impl IntoTime for f64 {
    fn into_time(self) -> Time {
        tracing::warn!(value = self, "unitless number used as a duration; assuming seconds");
        Time(self)
    }
}

/// Conversion into [`Freq`] for API boundaries.
///
/// Implemented for `Freq` itself (identity) and for bare `f64`, which is
/// interpreted as Hertz with a logged warning.
pub trait IntoFreq {
    /// Convert to a frequency quantity.
    fn into_freq(self) -> Freq;
}

impl IntoFreq for Freq {
    fn into_freq(self) -> Freq {
        self
    }
}

impl IntoFreq for f64 {
    fn into_freq(self) -> Freq {
        tracing::warn!(value = self, "unitless number used as a frequency; assuming Hz");
        Freq(self)
    }
}
