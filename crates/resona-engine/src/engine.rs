//! The audio engine: lifecycle, scheduling, and channel management.

use std::sync::{Arc, Mutex};

use resona_core::{CanonicalSound, SoundError};
use ringbuf::traits::{Observer, Producer};
use tracing::{info, warn};

use crate::backend::{AudioBackend, BackendStreamConfig, StreamHandle};
use crate::cache::SoundCache;
use crate::cpal_backend::CpalBackend;
use crate::mixer::{EngineShared, Mixer};
use crate::queue::{ChannelProducer, TimedSound, channel_pair};
use crate::{EngineError, Result};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub rate: u32,
    /// Number of discrete playback channels. The same number of streaming
    /// channels is reserved alongside them.
    pub num_channels: usize,
    /// Queue depth per discrete channel.
    pub queue_size: usize,
    /// Frames per device buffer (the stream unit).
    pub stream_unit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            rate: 44100,
            num_channels: 8,
            queue_size: 8,
            stream_unit: 2048,
        }
    }
}

/// Capacity of each streaming channel's queue: the slot being mixed plus
/// one lookahead slot for the caller to refill.
const STREAM_QUEUE_CAPACITY: usize = 2;

/// The playback engine.
///
/// Owns the hardware stream, one producer per channel queue, and the sound
/// cache. Channels are numbered from 1 in the public API; `None` selects
/// all channels (for pause/resume/stop) or automatic assignment (for play).
pub struct AudioEngine {
    _stream: StreamHandle,
    producers: Vec<ChannelProducer>,
    shared: Arc<EngineShared>,
    stream_error: Arc<Mutex<Option<String>>>,
    warning: Option<String>,
    cache: SoundCache,
    config: EngineConfig,
}

impl AudioEngine {
    /// Open the default output device and start the callback.
    ///
    /// Fails with [`EngineError::Device`] when the driver cannot supply the
    /// requested rate. Setting up a second engine while one exists is the
    /// re-setup path: drop (or [`close`](Self::close)) the old one first;
    /// its cache goes with it, which is what invalidates stale
    /// canonicalizations.
    pub fn setup(config: EngineConfig) -> Result<Self> {
        Self::setup_with_backend(&CpalBackend::new(), config)
    }

    /// Open an engine on an explicit backend (used with the mock backend in
    /// tests, or an alternative device layer).
    pub fn setup_with_backend(backend: &dyn AudioBackend, config: EngineConfig) -> Result<Self> {
        if config.num_channels == 0 {
            return Err(EngineError::Device(
                "engine needs at least one channel".into(),
            ));
        }
        if config.rate == 0 {
            return Err(EngineError::Device("sample rate must be positive".into()));
        }

        // First N queues play discrete sounds; the second N are reserved
        // for streaming with a two-slot lookahead.
        let mut producers = Vec::with_capacity(config.num_channels * 2);
        let mut lanes = Vec::with_capacity(config.num_channels * 2);
        for i in 0..config.num_channels * 2 {
            let capacity = if i < config.num_channels {
                config.queue_size
            } else {
                STREAM_QUEUE_CAPACITY
            };
            let (prod, lane) = channel_pair(capacity);
            producers.push(prod);
            lanes.push(lane);
        }

        let shared = Arc::new(EngineShared::new());
        let mut mixer = Mixer::new(lanes, Arc::clone(&shared), config.rate);

        let stream_error = Arc::new(Mutex::new(None::<String>));
        let error_store = Arc::clone(&stream_error);

        let stream = backend.build_output_stream(
            &BackendStreamConfig {
                sample_rate: config.rate,
                buffer_frames: config.stream_unit as u32,
            },
            Box::new(move |out, timing| mixer.mix_into(out, timing)),
            Box::new(move |msg| {
                tracing::error!(error = msg, "audio stream error");
                if let Ok(mut slot) = error_store.lock() {
                    *slot = Some(msg.to_string());
                }
            }),
        )?;

        info!(
            backend = backend.name(),
            rate = config.rate,
            channels = config.num_channels,
            queue = config.queue_size,
            stream_unit = config.stream_unit,
            "audio engine started"
        );

        Ok(AudioEngine {
            _stream: stream,
            producers,
            shared,
            stream_error,
            warning: None,
            cache: SoundCache::new(),
            config,
        })
    }

    /// The engine's output sample rate.
    pub fn samplerate(&self) -> u32 {
        self.config.rate
    }

    /// The number of discrete playback channels.
    pub fn num_channels(&self) -> usize {
        self.config.num_channels
    }

    /// The current time on the engine's monotonic stream clock, in seconds.
    pub fn now(&self) -> f64 {
        self.shared.frames_elapsed() as f64 / f64::from(self.config.rate)
    }

    /// Estimated output latency: one device buffer plus the driver's own
    /// reported callback-to-DAC delay.
    pub fn current_latency(&self) -> f64 {
        self.shared.last_buffer_frames() as f64 / f64::from(self.config.rate)
            + self.shared.latency()
    }

    /// The engine's canonicalization cache.
    pub fn cache(&mut self) -> &mut SoundCache {
        &mut self.cache
    }

    /// Enqueue a sound for playback.
    ///
    /// `when` is an absolute time on the engine clock; zero (or negative)
    /// means "as soon as possible". `channel` is a 1-based discrete channel
    /// number, or `None` to auto-assign the idle unpaused channel whose
    /// queue drains soonest. Returns the channel the sound landed on.
    ///
    /// The sound must already be canonical at the engine rate; a mismatch
    /// fails with [`SoundError::RateMismatch`]. A `when` that is already
    /// inside the latency horizon is played as early as possible and noted
    /// as a late-playback warning.
    pub fn play(
        &mut self,
        sound: &CanonicalSound,
        when: f64,
        channel: Option<usize>,
    ) -> Result<usize> {
        self.check_rate(sound)?;

        let idx = match channel {
            Some(ch) => {
                if ch == 0 || ch > self.config.num_channels {
                    return Err(EngineError::BadChannel(ch));
                }
                ch - 1
            }
            None => self.auto_assign()?,
        };

        if when > 0.0 {
            let earliest = self.now() + self.current_latency();
            if when < earliest {
                let msg = format!(
                    "requested start {when:.4}s is inside the latency horizon ({earliest:.4}s); playing as early as possible"
                );
                warn!("{msg}");
                self.warning = Some(msg);
            }
        }

        let start = if when > 0.0 { when } else { -1.0 };
        self.producers[idx]
            .ring
            .try_push(TimedSound::new(sound, start))
            .map_err(|_| EngineError::QueueFull)?;
        Ok(idx + 1)
    }

    /// Enqueue the next buffer of a stream source onto a streaming channel.
    ///
    /// Streaming channels hold the buffer being mixed plus one lookahead
    /// slot; when the slot is still full the call fails with
    /// [`EngineError::QueueFull`] and the caller retries after the next
    /// callback. If the channel is paused, the paused buffer is spliced out
    /// and the channel resumes with the new one.
    pub fn play_next(&mut self, sound: &CanonicalSound, channel: usize) -> Result<()> {
        self.check_rate(sound)?;
        if channel == 0 || channel > self.config.num_channels {
            return Err(EngineError::BadChannel(channel));
        }
        let idx = self.config.num_channels + channel - 1;
        if self.producers[idx].ring.is_full() {
            return Err(EngineError::QueueFull);
        }
        let paused = self.producers[idx].shared.is_paused();
        self.producers[idx]
            .ring
            .try_push(TimedSound::new(sound, -1.0))
            .map_err(|_| EngineError::QueueFull)?;
        if paused {
            // Drop the interrupted buffer and pick up with the new one.
            self.producers[idx].shared.request_skip();
        }
        Ok(())
    }

    /// Pause a channel (or all channels of the selected kind with `None`).
    ///
    /// Takes effect at the next callback; audio already being mixed into
    /// the current buffer still plays.
    pub fn pause(&mut self, channel: Option<usize>, stream: bool) -> Result<()> {
        self.for_each_selected(channel, stream, |shared| shared.set_paused(true))
    }

    /// Resume a paused channel (or all channels of the selected kind).
    pub fn resume(&mut self, channel: Option<usize>, stream: bool) -> Result<()> {
        self.for_each_selected(channel, stream, |shared| shared.set_paused(false))
    }

    /// Stop a channel: everything queued is released at the next callback.
    /// In-flight audio in the current device buffer still plays, bounded by
    /// one stream unit.
    pub fn stop(&mut self, channel: Option<usize>) -> Result<()> {
        self.for_each_selected(channel, false, |shared| shared.request_flush())?;
        self.for_each_selected(channel, true, |shared| shared.request_flush())
    }

    /// Take the pending one-shot warning, if any. Late playback observed by
    /// the callback since the last inspection is reported here and cleared.
    pub fn take_warning(&mut self) -> Option<String> {
        let late = self.shared.take_playback_error();
        if late < 0 {
            let msg = format!("playback fell {} frames behind schedule", -late);
            warn!("{msg}");
            return Some(msg);
        }
        self.warning.take()
    }

    /// Take the last device error reported by the stream, if any.
    pub fn take_error(&self) -> Option<String> {
        self.stream_error.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Stop the stream and release every queued sound.
    pub fn close(self) {
        info!("audio engine closed");
        drop(self);
    }

    fn check_rate(&self, sound: &CanonicalSound) -> Result<()> {
        if sound.samplerate() != self.config.rate {
            return Err(EngineError::Sound(SoundError::RateMismatch {
                found: sound.samplerate(),
                required: self.config.rate,
            }));
        }
        Ok(())
    }

    /// Pick the idle, unpaused discrete channel whose tail drains soonest.
    fn auto_assign(&self) -> Result<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, prod) in self.producers[..self.config.num_channels].iter().enumerate() {
            if prod.shared.is_paused() || prod.ring.is_full() {
                continue;
            }
            let done_at = prod.shared.done_at();
            if best.is_none_or(|(_, t)| done_at < t) {
                best = Some((idx, done_at));
            }
        }
        best.map(|(idx, _)| idx).ok_or(EngineError::NoChannels)
    }

    fn for_each_selected(
        &mut self,
        channel: Option<usize>,
        stream: bool,
        f: impl Fn(&crate::queue::ChannelShared),
    ) -> Result<()> {
        let base = if stream { self.config.num_channels } else { 0 };
        match channel {
            Some(ch) => {
                if ch == 0 || ch > self.config.num_channels {
                    return Err(EngineError::BadChannel(ch));
                }
                f(&self.producers[base + ch - 1].shared);
            }
            None => {
                for prod in &self.producers[base..base + self.config.num_channels] {
                    f(&prod.shared);
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("rate", &self.config.rate)
            .field("num_channels", &self.config.num_channels)
            .finish_non_exhaustive()
    }
}
