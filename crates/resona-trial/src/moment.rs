//! Moments: the tagged scheduling units of an experiment.

use std::collections::VecDeque;

use resona_core::IntoTime;

use crate::event::Event;
use crate::experiment::TrialCtx;
use crate::Result;

/// A user function run by a moment.
pub type MomentFn = Box<dyn FnMut(&mut TrialCtx<'_>) -> Result<()> + 'static>;

/// A predicate over input events; `Ok(true)` accepts the event and
/// completes the response moment.
pub type EventFilter = Box<dyn FnMut(&Event, &mut TrialCtx<'_>) -> Result<bool> + 'static>;

/// An expansion function evaluated at dispatch time: `Some(body)` emits the
/// body onto the queue, `None` retires the moment.
pub type ExpandFn = Box<dyn FnMut(&mut TrialCtx<'_>) -> Result<Option<Vec<Moment>>> + 'static>;

/// The experiment-wide event watcher, invoked on every input event before
/// moment dispatch.
pub type Watcher = Box<dyn FnMut(&Event, &mut TrialCtx<'_>) -> Result<()> + 'static>;

/// A dispatchable scheduling unit. Semantics are defined by the variant;
/// dispatch is a single match in the scheduler.
pub enum Moment {
    /// Run `action` once `delta_t` seconds have passed since the preceding
    /// moment's start.
    Timed {
        /// Delay from the previous moment's start, in seconds.
        delta_t: f64,
        /// The function to run.
        action: MomentFn,
    },

    /// A trial or practice boundary: bumps the offset counter (and the
    /// trial counter for real trials), resets the response watcher, records
    /// a start event, then completes immediately.
    OffsetStart {
        /// True for practice blocks, which do not advance the trial count.
        practice: bool,
    },

    /// Wait for an input event satisfying `accept`, with an optional
    /// timeout and a minimum time floor before the next moment may start.
    Response {
        /// Predicate deciding whether an event completes the wait.
        accept: EventFilter,
        /// Seconds after which the wait gives up, if set.
        timeout: Option<f64>,
        /// Run when the timeout fires.
        on_timeout: Option<MomentFn>,
        /// Minimum seconds between this moment's start and the next
        /// moment's start, even for fast responses.
        atleast: f64,
    },

    /// Present children as a parallel sub-queue starting at this moment's
    /// start time.
    Compound {
        /// The child moments.
        children: Vec<Moment>,
    },

    /// Evaluated at dispatch time; emits its body while the expansion
    /// function says so. With `looping`, the moment re-queues itself after
    /// each emission, re-evaluating after the body has run.
    Expanding {
        /// Produces the body to emit, or `None` to retire.
        expand: ExpandFn,
        /// Re-evaluate after each emission.
        looping: bool,
    },

    /// Runs only when no other queue has work left; until then it migrates
    /// to the tail of whichever queue is still busy.
    Final {
        /// The function to run.
        action: MomentFn,
    },
}

impl Moment {
    /// A moment that runs immediately after the previous one.
    pub fn run(action: impl FnMut(&mut TrialCtx<'_>) -> Result<()> + 'static) -> Moment {
        Moment::Timed {
            delta_t: 0.0,
            action: Box::new(action),
        }
    }

    /// A moment that runs `delta_t` after the previous moment's start.
    pub fn timed(
        delta_t: impl IntoTime,
        action: impl FnMut(&mut TrialCtx<'_>) -> Result<()> + 'static,
    ) -> Moment {
        Moment::Timed {
            delta_t: delta_t.into_time().as_secs(),
            action: Box::new(action),
        }
    }

    /// A trial boundary.
    pub fn trial_start() -> Moment {
        Moment::OffsetStart { practice: false }
    }

    /// A practice boundary: advances the offset counter only.
    pub fn practice_start() -> Moment {
        Moment::OffsetStart { practice: true }
    }

    /// Begin building a response moment from an acceptance predicate.
    pub fn response(
        accept: impl FnMut(&Event, &mut TrialCtx<'_>) -> Result<bool> + 'static,
    ) -> ResponseBuilder {
        ResponseBuilder {
            accept: Box::new(accept),
            timeout: None,
            on_timeout: None,
            atleast: 0.0,
        }
    }

    /// A compound moment presenting `children` in parallel with the rest of
    /// the queue.
    pub fn compound(children: Vec<Moment>) -> Moment {
        Moment::Compound { children }
    }

    /// A moment that runs only once every queue has drained.
    pub fn final_step(action: impl FnMut(&mut TrialCtx<'_>) -> Result<()> + 'static) -> Moment {
        Moment::Final {
            action: Box::new(action),
        }
    }

    /// True for [`Moment::Final`].
    pub fn is_final(&self) -> bool {
        matches!(self, Moment::Final { .. })
    }
}

impl std::fmt::Debug for Moment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Moment::Timed { delta_t, .. } => f.debug_struct("Timed").field("delta_t", delta_t).finish_non_exhaustive(),
            Moment::OffsetStart { practice } => f
                .debug_struct("OffsetStart")
                .field("practice", practice)
                .finish(),
            Moment::Response { timeout, atleast, .. } => f
                .debug_struct("Response")
                .field("timeout", timeout)
                .field("atleast", atleast)
                .finish_non_exhaustive(),
            Moment::Compound { children } => f
                .debug_struct("Compound")
                .field("children", &children.len())
                .finish(),
            Moment::Expanding { looping, .. } => f
                .debug_struct("Expanding")
                .field("looping", looping)
                .finish_non_exhaustive(),
            Moment::Final { .. } => f.debug_struct("Final").finish_non_exhaustive(),
        }
    }
}

/// Builder for [`Moment::Response`].
pub struct ResponseBuilder {
    accept: EventFilter,
    timeout: Option<f64>,
    on_timeout: Option<MomentFn>,
    atleast: f64,
}

impl ResponseBuilder {
    /// Give up after `secs` seconds.
    pub fn timeout(mut self, secs: f64) -> Self {
        self.timeout = Some(secs);
        self
    }

    /// Run `action` when the timeout fires.
    pub fn on_timeout(
        mut self,
        action: impl FnMut(&mut TrialCtx<'_>) -> Result<()> + 'static,
    ) -> Self {
        self.on_timeout = Some(Box::new(action));
        self
    }

    /// Hold the next moment back until at least `secs` seconds after this
    /// moment's start, even when the response comes sooner.
    pub fn atleast(mut self, secs: f64) -> Self {
        self.atleast = secs;
        self
    }

    /// Finish the builder.
    pub fn end(self) -> Moment {
        Moment::Response {
            accept: self.accept,
            timeout: self.timeout,
            on_timeout: self.on_timeout,
            atleast: self.atleast,
        }
    }
}

/// An ordered queue of moments plus the start time of its most recently
/// dispatched moment.
#[derive(Debug)]
pub struct MomentQueue {
    pub(crate) moments: VecDeque<Moment>,
    /// Start time of the most recent moment, on the run-loop clock.
    pub(crate) last: f64,
}

impl MomentQueue {
    /// A queue over the given moments, starting its clock at `last`.
    pub fn new(moments: Vec<Moment>, last: f64) -> Self {
        MomentQueue {
            moments: moments.into(),
            last,
        }
    }

    /// True when nothing remains to dispatch.
    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }

    /// Number of queued moments.
    pub fn len(&self) -> usize {
        self.moments.len()
    }
}
