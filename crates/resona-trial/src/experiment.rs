//! The experiment facade: runtime state, the moment-function context, and
//! the top-level setup/run lifecycle.

use resona_core::CanonicalSound;
use resona_engine::{AudioEngine, EngineError};
use tracing::debug;

use crate::config::SessionConfig;
use crate::event::EventSource;
use crate::moment::{Moment, MomentFn, Watcher};
use crate::record::Recorder;
use crate::scheduler::Scheduler;
use crate::{Result, TrialError};

/// Mutable experiment state shared by every moment function: the engine,
/// the recorder, the trial/offset counters, and the event watcher.
pub struct Runtime {
    pub(crate) engine: Option<AudioEngine>,
    pub(crate) recorder: Option<Recorder>,
    pub(crate) trial: u32,
    pub(crate) offset: u32,
    pub(crate) start_offset: u32,
    pub(crate) watcher: Option<Watcher>,
    pub(crate) last_event_time: f64,
}

impl Runtime {
    /// A runtime writing through `recorder`, suppressing records until the
    /// offset counter reaches `start_offset`.
    pub fn new(recorder: Option<Recorder>, start_offset: u32) -> Self {
        Runtime {
            engine: None,
            recorder,
            trial: 0,
            offset: 0,
            start_offset,
            watcher: None,
            last_event_time: 0.0,
        }
    }

    /// A runtime with no recorder and no engine, for scheduling-only use.
    pub fn bare() -> Self {
        Self::new(None, 0)
    }

    /// Attach (or replace) the audio engine.
    pub fn set_engine(&mut self, engine: AudioEngine) {
        self.engine = Some(engine);
    }

    /// Detach the audio engine, if any.
    pub fn take_engine(&mut self) -> Option<AudioEngine> {
        self.engine.take()
    }

    /// The trial counter.
    pub fn trial(&self) -> u32 {
        self.trial
    }

    /// The offset counter.
    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// The context handed to every moment function, predicate, and watcher.
///
/// Borrows the runtime for the duration of one dispatch, so moment code can
/// play sounds, record events, and replace the watcher without touching the
/// queues it is itself stored in.
pub struct TrialCtx<'a> {
    /// The run-loop clock at dispatch, in seconds since the run started.
    pub now: f64,
    rt: &'a mut Runtime,
}

impl<'a> TrialCtx<'a> {
    pub(crate) fn new(now: f64, rt: &'a mut Runtime) -> Self {
        TrialCtx { now, rt }
    }

    /// The trial counter.
    pub fn trial(&self) -> u32 {
        self.rt.trial
    }

    /// The offset counter.
    pub fn offset(&self) -> u32 {
        self.rt.offset
    }

    /// Time of the most recent input event, on the run-loop clock.
    pub fn last_event_time(&self) -> f64 {
        self.rt.last_event_time
    }

    /// The audio engine, or [`EngineError::NotReady`] when none is
    /// attached.
    pub fn engine(&mut self) -> Result<&mut AudioEngine> {
        self.rt
            .engine
            .as_mut()
            .ok_or(TrialError::Engine(EngineError::NotReady))
    }

    /// Play a canonicalized sound through the engine as soon as possible on
    /// an auto-assigned channel. Returns the channel used.
    pub fn play(&mut self, sound: &CanonicalSound) -> Result<usize> {
        Ok(self.engine()?.play(sound, 0.0, None)?)
    }

    /// Play with an explicit engine-clock start time and channel choice.
    pub fn play_at(
        &mut self,
        sound: &CanonicalSound,
        when: f64,
        channel: Option<usize>,
    ) -> Result<usize> {
        Ok(self.engine()?.play(sound, when, channel)?)
    }

    /// Record one event row with the current counters and clock.
    ///
    /// Suppressed while the offset counter is below the session's start
    /// offset, so a replayed experiment re-executes moments without
    /// duplicating rows.
    pub fn record(&mut self, code: &str, values: &[(&str, &str)]) -> Result<()> {
        if self.rt.offset < self.rt.start_offset {
            debug!(code, offset = self.rt.offset, "record suppressed before start offset");
            return Ok(());
        }
        let Some(recorder) = self.rt.recorder.as_mut() else {
            debug!(code, "no recorder attached; event dropped");
            return Ok(());
        };
        recorder.record(code, self.now, self.rt.offset, self.rt.trial, values)?;
        Ok(())
    }

    /// Replace the experiment-wide event watcher.
    pub fn set_watcher(
        &mut self,
        watcher: impl FnMut(&crate::event::Event, &mut TrialCtx<'_>) -> Result<()> + 'static,
    ) {
        self.rt.watcher = Some(Box::new(watcher));
    }

    /// Remove the event watcher.
    pub fn clear_watcher(&mut self) {
        self.rt.watcher = None;
    }
}

/// A complete experiment: moment queues plus runtime state.
pub struct Experiment {
    scheduler: Scheduler,
    runtime: Runtime,
}

impl Experiment {
    /// Build an experiment from a session configuration. The recorder is
    /// created immediately so column collisions fail before any trial
    /// runs; the engine is attached separately.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let info: Vec<(String, String)> = config.info.into_iter().collect();
        let recorder = Recorder::new(&config.output, info, config.columns)?;
        Ok(Experiment {
            scheduler: Scheduler::new(),
            runtime: Runtime::new(Some(recorder), config.start_offset),
        })
    }

    /// Build an experiment with an engine already attached.
    pub fn with_engine(config: SessionConfig, engine: AudioEngine) -> Result<Self> {
        let mut exp = Self::new(config)?;
        exp.runtime.set_engine(engine);
        Ok(exp)
    }

    /// Attach (or replace) the audio engine.
    pub fn set_engine(&mut self, engine: AudioEngine) {
        self.runtime.set_engine(engine);
    }

    /// Add a queue of moments, dispatched in parallel with any other
    /// queues.
    pub fn add_moments(&mut self, moments: Vec<Moment>) {
        self.scheduler.add_queue(moments);
    }

    /// Add a moment that runs only after every queue has drained.
    pub fn add_final(&mut self, action: MomentFn) {
        self.scheduler.add_final(Moment::Final { action });
    }

    /// The trial counter.
    pub fn trial(&self) -> u32 {
        self.runtime.trial()
    }

    /// The offset counter.
    pub fn offset(&self) -> u32 {
        self.runtime.offset()
    }

    /// Direct access to the runtime, for embedding scenarios.
    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    /// Advance the experiment by one scheduler iteration at `now` seconds,
    /// feeding `events`. Returns false once every queue has drained.
    pub fn step(&mut self, now: f64, events: &[crate::event::Event]) -> Result<bool> {
        self.scheduler.step(now, events, &mut self.runtime)
    }

    /// Run the experiment to completion against an event source.
    ///
    /// The header row is stamped before the first moment dispatches. An
    /// error from any moment function aborts the run and propagates.
    pub fn run(&mut self, source: &mut dyn EventSource) -> Result<()> {
        if let Some(recorder) = self.runtime.recorder.as_mut() {
            recorder.write_header()?;
        }
        self.scheduler.run(&mut self.runtime, source)
    }
}
