//! Deterministic mock backend for tests.
//!
//! Instead of a hardware stream, the mock stores the engine's output
//! callback and lets the test pump it by hand with a synthetic clock. The
//! engine under test cannot tell the difference: it sees the same
//! [`StreamTiming`] contract a real driver provides, minus the scheduling
//! jitter.
//!
//! ```rust
//! use resona_engine::{AudioEngine, EngineConfig, mock::MockBackend};
//!
//! let backend = MockBackend::new();
//! let mut pump = backend.pump();
//! let engine =
//!     AudioEngine::setup_with_backend(&backend, EngineConfig::default()).unwrap();
//! // ... enqueue sounds ...
//! let rendered = pump.render(2048); // one synthetic callback
//! assert_eq!(rendered.len(), 2048 * 2);
//! # drop(engine);
//! ```

use std::sync::{Arc, Mutex};

use crate::backend::{
    AudioBackend, AudioDevice, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle,
    StreamTiming,
};
use crate::Result;

#[derive(Default)]
struct MockInner {
    callback: Option<OutputCallback>,
    rate: u32,
}

/// A backend whose "device" is the test itself.
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockInner>>,
}

impl MockBackend {
    /// Create a mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// A pump for driving the stored callback. Valid once an engine has
    /// been set up on this backend.
    pub fn pump(&self) -> MockPump {
        MockPump {
            inner: Arc::clone(&self.inner),
            clock_frames: 0,
            output_delay: 0.005,
        }
    }
}

/// Drives the engine's callback with a synthetic clock.
pub struct MockPump {
    inner: Arc<Mutex<MockInner>>,
    clock_frames: u64,
    output_delay: f64,
}

impl MockPump {
    /// Set the simulated callback-to-DAC delay in seconds.
    pub fn set_output_delay(&mut self, delay: f64) {
        self.output_delay = delay;
    }

    /// The pump's current stream time in seconds.
    pub fn stream_time(&self) -> f64 {
        let rate = self.rate();
        if rate == 0 {
            return 0.0;
        }
        self.clock_frames as f64 / f64::from(rate)
    }

    fn rate(&self) -> u32 {
        self.inner.lock().map(|g| g.rate).unwrap_or(0)
    }

    /// Run one synthetic callback of `frames` stereo frames, returning the
    /// interleaved buffer the engine produced. Renders silence when no
    /// engine is attached.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; frames * 2];
        let Ok(mut guard) = self.inner.lock() else {
            return out;
        };
        let rate = f64::from(guard.rate.max(1));
        let stream_time = self.clock_frames as f64 / rate;
        let timing = StreamTiming {
            frames,
            output_time: stream_time + self.output_delay,
            stream_time,
        };
        if let Some(cb) = guard.callback.as_mut() {
            cb(&mut out, &timing);
        }
        self.clock_frames += frames as u64;
        out
    }
}

impl AudioBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_outputs(&self) -> Result<Vec<AudioDevice>> {
        Ok(vec![AudioDevice {
            name: "mock output".into(),
            default_sample_rate: 44100,
        }])
    }

    fn default_output(&self) -> Result<Option<AudioDevice>> {
        Ok(self.list_outputs()?.into_iter().next())
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        _error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        if let Ok(mut guard) = self.inner.lock() {
            guard.callback = Some(callback);
            guard.rate = config.sample_rate;
        }
        Ok(StreamHandle::new(()))
    }
}
