//! Resona Trial - moment scheduling and event recording for experiments.
//!
//! An experiment is a set of [`MomentQueue`]s advanced by a cooperative
//! run loop. Each *moment* is one dispatchable scheduling unit: run a
//! function after a delay, wait for a response, mark a trial boundary,
//! spawn a parallel sub-queue, or expand conditionally at dispatch time.
//!
//! # Why moments instead of plain control flow
//!
//! Trial structure often depends on state mutated by earlier trials ("run
//! the catch block only if the listener missed"). Host-language `if`/
//! `while` would evaluate those conditions while the experiment is being
//! *built*, before any trial has run. [`Moment::Expanding`] defers the
//! condition to dispatch time, so [`when`] and [`repeat_while`] blocks see
//! the live state.
//!
//! # Sketch
//!
//! ```rust,no_run
//! use resona_trial::{Experiment, Moment, QueuedSource, SessionConfig};
//!
//! let config = SessionConfig::new("session.csv");
//! let mut exp = Experiment::new(config).unwrap();
//! exp.add_moments(vec![
//!     Moment::trial_start(),
//!     Moment::run(|ctx| ctx.record("stimulus", &[])),
//!     Moment::response(|event, _ctx| Ok(event.is_key_down())).timeout(2.0).end(),
//! ]);
//! let mut source = QueuedSource::new();
//! exp.run(&mut source).unwrap();
//! ```

pub mod block;
pub mod config;
pub mod event;
pub mod experiment;
pub mod moment;
pub mod record;
pub mod scheduler;

pub use block::{block, repeat_while, when, Branches};
pub use config::{ConfigError, EngineSettings, SessionConfig};
pub use event::{ChannelSource, Event, EventSource, Key, MouseButton, QueuedSource};
pub use experiment::{Experiment, Runtime, TrialCtx};
pub use moment::{Moment, MomentFn, MomentQueue, ResponseBuilder, Watcher};
pub use record::{RecordError, Recorder, RESERVED_COLUMNS};
pub use scheduler::Scheduler;

use resona_engine::EngineError;

/// Errors surfaced by the scheduler and recorder.
///
/// An error returned from a user moment function propagates out of the run
/// loop and terminates the trial group.
#[derive(Debug, thiserror::Error)]
pub enum TrialError {
    /// Engine failure while a moment was playing audio.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Recorder failure.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error raised by user moment code.
    #[error("experiment error: {0}")]
    Custom(String),
}

impl TrialError {
    /// Build an error from user moment code.
    pub fn custom(message: impl Into<String>) -> Self {
        TrialError::Custom(message.into())
    }
}

/// Convenience result type for trial operations.
pub type Result<T> = std::result::Result<T, TrialError>;
