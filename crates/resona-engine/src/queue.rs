//! Per-channel playback queues across the realtime boundary.
//!
//! Each channel is a single-producer/single-consumer ring of [`TimedSound`]
//! records plus a small set of shared atomics. The control thread owns the
//! producer half and the pause/skip/flush request flags; the audio callback
//! owns the consumer half and the timing outputs (`done_at`). Ring capacity
//! is rounded up to a power of two.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use resona_core::CanonicalSound;
use ringbuf::traits::Split;
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// A sound bound to its playback schedule.
///
/// Created by the control thread on enqueue; consumed and eventually
/// dropped by the callback once `offset == len`. The `Arc` clone keeps the
/// sample buffer alive while in flight, so the drop in the callback is a
/// plain reference-count decrement on exclusively-owned data.
#[derive(Debug)]
pub(crate) struct TimedSound {
    /// Interleaved stereo fixed-point samples.
    pub data: Arc<[i16]>,
    /// Scheduled start on the stream clock, in seconds. Non-positive means
    /// "as soon as possible".
    pub start: f64,
    /// Frames already mixed.
    pub offset: usize,
    /// Total frames.
    pub len: usize,
}

impl TimedSound {
    pub fn new(sound: &CanonicalSound, start: f64) -> Self {
        TimedSound {
            data: Arc::clone(sound.data()),
            start,
            offset: 0,
            len: sound.nframes(),
        }
    }
}

/// Flags and timing shared between one channel's producer and consumer.
#[derive(Debug)]
pub(crate) struct ChannelShared {
    paused: AtomicBool,
    /// Stream time at which the currently-mixing tail finishes, as f64 bits.
    done_at: AtomicU64,
    /// Control requests the callback drop its current head (play_next on a
    /// paused stream channel).
    skip_current: AtomicBool,
    /// Control requests the callback drop everything queued (stop).
    flush: AtomicBool,
}

impl ChannelShared {
    fn new() -> Self {
        ChannelShared {
            paused: AtomicBool::new(false),
            done_at: AtomicU64::new(0f64.to_bits()),
            skip_current: AtomicBool::new(false),
            flush: AtomicBool::new(false),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    pub fn done_at(&self) -> f64 {
        f64::from_bits(self.done_at.load(Ordering::Acquire))
    }

    pub fn set_done_at(&self, time: f64) {
        self.done_at.store(time.to_bits(), Ordering::Release);
    }

    pub fn request_skip(&self) {
        self.skip_current.store(true, Ordering::Release);
    }

    pub fn take_skip(&self) -> bool {
        self.skip_current.swap(false, Ordering::AcqRel)
    }

    pub fn request_flush(&self) {
        self.flush.store(true, Ordering::Release);
    }

    pub fn take_flush(&self) -> bool {
        self.flush.swap(false, Ordering::AcqRel)
    }
}

/// Control-thread half of a channel.
pub(crate) struct ChannelProducer {
    pub ring: HeapProd<TimedSound>,
    pub shared: Arc<ChannelShared>,
}

/// Callback half of a channel: the ring consumer plus the head currently
/// being mixed. Holding the head outside the ring lets the callback mix a
/// sound across many buffers without re-reading the slot.
pub(crate) struct ChannelLane {
    pub ring: HeapCons<TimedSound>,
    pub current: Option<TimedSound>,
    pub shared: Arc<ChannelShared>,
}

/// Allocate one channel's ring (capacity rounded up to a power of two) and
/// split it across the boundary.
pub(crate) fn channel_pair(capacity: usize) -> (ChannelProducer, ChannelLane) {
    let ring = HeapRb::<TimedSound>::new(capacity.max(1).next_power_of_two());
    let (prod, cons) = ring.split();
    let shared = Arc::new(ChannelShared::new());
    (
        ChannelProducer {
            ring: prod,
            shared: Arc::clone(&shared),
        },
        ChannelLane {
            ring: cons,
            current: None,
            shared,
        },
    )
}
