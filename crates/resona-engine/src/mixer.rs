//! The realtime mixing callback.
//!
//! [`Mixer::mix_into`] runs on the audio thread once per device buffer. It
//! is allocation-free and lock-free: channel heads arrive through SPSC
//! rings, control requests through per-channel atomics, and timing results
//! leave through the engine-wide atomics in [`EngineShared`].

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};

use resona_core::fixed_to_f32;
use ringbuf::traits::Consumer;

use crate::backend::StreamTiming;
use crate::queue::ChannelLane;

/// Engine-wide state written by the callback and read by control code.
#[derive(Debug)]
pub(crate) struct EngineShared {
    /// Estimated output latency in seconds, as f64 bits.
    latency: AtomicU64,
    /// Frame count of the most recent device buffer.
    last_buffer_frames: AtomicUsize,
    /// Accumulated lateness: decremented by the number of frames each late
    /// sound missed its start by. Zero means no late playback since the
    /// last inspection.
    playback_error: AtomicI64,
    /// Total frames handed to the device; the engine's monotonic clock.
    frames_elapsed: AtomicU64,
}

impl EngineShared {
    pub fn new() -> Self {
        EngineShared {
            latency: AtomicU64::new(0f64.to_bits()),
            last_buffer_frames: AtomicUsize::new(0),
            playback_error: AtomicI64::new(0),
            frames_elapsed: AtomicU64::new(0),
        }
    }

    pub fn latency(&self) -> f64 {
        f64::from_bits(self.latency.load(Ordering::Acquire))
    }

    pub fn last_buffer_frames(&self) -> usize {
        self.last_buffer_frames.load(Ordering::Acquire)
    }

    /// Take and clear the accumulated lateness (negative frame count).
    pub fn take_playback_error(&self) -> i64 {
        self.playback_error.swap(0, Ordering::AcqRel)
    }

    pub fn frames_elapsed(&self) -> u64 {
        self.frames_elapsed.load(Ordering::Acquire)
    }
}

/// The audio-thread side of the engine: all channel lanes plus the shared
/// timing outputs.
pub(crate) struct Mixer {
    lanes: Vec<ChannelLane>,
    shared: Arc<EngineShared>,
    rate: f64,
}

impl Mixer {
    pub fn new(lanes: Vec<ChannelLane>, shared: Arc<EngineShared>, rate: u32) -> Self {
        Mixer {
            lanes,
            shared,
            rate: f64::from(rate),
        }
    }

    /// Fill one interleaved stereo buffer.
    ///
    /// Implements the callback contract: zero the buffer, record timing,
    /// then for every unpaused lane mix queued sounds in order, scheduling
    /// unstarted heads relative to `t.output_time` and accounting for late
    /// arrivals.
    pub fn mix_into(&mut self, out: &mut [f32], t: &StreamTiming) {
        let frames = t.frames.min(out.len() / 2);
        out.fill(0.0);

        self.shared
            .latency
            .store((t.output_time - t.stream_time).to_bits(), Ordering::Release);
        self.shared
            .last_buffer_frames
            .store(frames, Ordering::Release);
        self.shared
            .frames_elapsed
            .fetch_add(frames as u64, Ordering::AcqRel);

        let rate = self.rate;
        let buf_end = t.output_time + frames as f64 / rate;

        for lane in &mut self.lanes {
            if lane.shared.take_flush() {
                lane.current = None;
                while lane.ring.try_pop().is_some() {}
            }
            if lane.shared.take_skip() {
                lane.current = None;
                lane.shared.set_paused(false);
            }
            if lane.shared.is_paused() {
                continue;
            }

            let mut write_off = 0usize;
            while write_off < frames {
                if lane.current.is_none() {
                    lane.current = lane.ring.try_pop();
                }
                let Some(head) = lane.current.as_mut() else {
                    // Nothing left on this channel.
                    lane.shared.set_done_at(buf_end);
                    break;
                };

                if head.offset == 0 {
                    if head.start <= 0.0 {
                        // ASAP: start at the current write position.
                        head.start = t.output_time + write_off as f64 / rate;
                        lane.shared
                            .set_done_at(head.start + head.len as f64 / rate);
                    } else if head.start < buf_end {
                        // The 1e-9 nudge keeps f64 rounding from flipping a
                        // frame-boundary start to the neighboring frame.
                        let zero_padding =
                            ((head.start - t.output_time) * rate + 1e-9).floor() as i64;
                        if zero_padding < write_off as i64 {
                            // Too late to start on schedule: pull forward
                            // and account for the missed frames.
                            let missed = write_off as i64 - zero_padding;
                            self.shared
                                .playback_error
                                .fetch_sub(missed, Ordering::AcqRel);
                            head.start = t.output_time + write_off as f64 / rate;
                        } else {
                            // Idle until the scheduled frame.
                            write_off = (zero_padding as usize).min(frames);
                            head.start = t.output_time + write_off as f64 / rate;
                        }
                        lane.shared
                            .set_done_at(head.start + head.len as f64 / rate);
                    } else {
                        // Belongs to a future buffer; stop consuming here.
                        break;
                    }
                }

                let n = (frames - write_off).min(head.len - head.offset);
                for k in 0..n {
                    let src = (head.offset + k) * 2;
                    let dst = (write_off + k) * 2;
                    out[dst] += fixed_to_f32(head.data[src]);
                    out[dst + 1] += fixed_to_f32(head.data[src + 1]);
                }
                head.offset += n;
                write_off += n;

                if head.offset == head.len {
                    // Finished: drop the buffer reference and advance.
                    lane.current = None;
                }
            }
        }
    }
}
