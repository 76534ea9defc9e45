//! Pluggable audio backend abstraction.
//!
//! The engine talks to hardware through the object-safe [`AudioBackend`]
//! trait rather than a specific platform API. The default implementation
//! wraps [cpal](https://crates.io/crates/cpal); the [`mock`](crate::mock)
//! module provides a deterministic backend that tests pump by hand.
//!
//! The trait uses boxed closures for callbacks so it stays object-safe and
//! backends can be selected at runtime. Stream handles are returned as
//! [`StreamHandle`], a type-erased wrapper that stops playback on drop,
//! keeping platform types out of engine code.

use crate::Result;

/// Configuration for building an output stream.
///
/// The engine is stereo-only, so no channel count appears here; backends
/// always open two channels.
#[derive(Debug, Clone)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred callback buffer size in frames (the stream unit).
    pub buffer_frames: u32,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_frames: 2048,
        }
    }
}

/// Description of an output device.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// The device's default output sample rate.
    pub default_sample_rate: u32,
}

/// Per-callback timing handed to the output callback.
///
/// All times are in seconds on the backend's monotonic stream clock, which
/// starts at zero when the stream opens.
#[derive(Debug, Clone, Copy)]
pub struct StreamTiming {
    /// Number of stereo frames requested in this callback.
    pub frames: usize,
    /// The stream time at which the first frame of this buffer will hit
    /// the DAC.
    pub output_time: f64,
    /// The current stream time when the callback fired.
    pub stream_time: f64,
}

/// Audio output callback signature.
///
/// Called on the realtime audio thread with a zeroable buffer of
/// interleaved stereo f32 samples (`frames * 2` long) and the timing for
/// this buffer. Implementations must not allocate, lock, or block.
pub type OutputCallback = Box<dyn FnMut(&mut [f32], &StreamTiming) + Send>;

/// Error callback signature; receives a human-readable message when the
/// backend fails during streaming.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Type-erased stream handle.
///
/// The stream plays while this handle exists; dropping it stops playback.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, keeping it alive until the
    /// handle is dropped.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Pluggable audio backend trait.
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g. "cpal", "mock").
    fn name(&self) -> &str;

    /// List the available output devices.
    fn list_outputs(&self) -> Result<Vec<AudioDevice>>;

    /// The system default output device, if any.
    fn default_output(&self) -> Result<Option<AudioDevice>>;

    /// Build and start a stereo output stream.
    ///
    /// Fails with [`EngineError::Device`](crate::EngineError::Device) when
    /// the device cannot supply the requested sample rate.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;
}
