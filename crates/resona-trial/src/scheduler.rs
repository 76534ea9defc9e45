//! The cooperative run loop and its dispatch rules.
//!
//! The scheduler advances every [`MomentQueue`] by at most one handle step
//! per iteration, after delivering any pending input events. The dispatch
//! core is the pure [`step`](Scheduler::step) function over an explicit
//! clock; [`run`](Scheduler::run) wraps it with the wall clock and an event
//! source, so tests drive the exact same code path with a manual clock.

use std::time::{Duration, Instant};

use crate::event::{Event, EventSource};
use crate::experiment::{Runtime, TrialCtx};
use crate::moment::{Moment, MomentQueue};
use crate::Result;

/// The set of moment queues of a running experiment.
#[derive(Debug, Default)]
pub struct Scheduler {
    queues: Vec<MomentQueue>,
}

impl Scheduler {
    /// An empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parallel queue of moments, starting its clock at zero.
    pub fn add_queue(&mut self, moments: Vec<Moment>) {
        self.queues.push(MomentQueue::new(moments, 0.0));
    }

    /// Append a final moment to the first queue (it migrates on its own
    /// until every queue has drained).
    pub fn add_final(&mut self, moment: Moment) {
        debug_assert!(moment.is_final());
        if let Some(queue) = self.queues.first_mut() {
            queue.moments.push_back(moment);
        } else {
            self.queues.push(MomentQueue::new(vec![moment], 0.0));
        }
    }

    /// True when every queue has drained.
    pub fn is_idle(&self) -> bool {
        self.queues.is_empty()
    }

    /// One iteration: deliver `events`, then give each queue one handle
    /// step. Returns false once all queues are empty.
    pub fn step(&mut self, now: f64, events: &[Event], rt: &mut Runtime) -> Result<bool> {
        for event in events {
            rt.last_event_time = now;
            self.run_watcher(now, event, rt)?;
            self.dispatch_event(now, event, rt)?;
        }

        // Queues appended during this pass (by compound moments) get their
        // first step on the next iteration.
        let count = self.queues.len();
        for qi in 0..count {
            self.dispatch_queue(qi, now, rt)?;
        }
        self.queues.retain(|q| !q.is_empty());
        Ok(!self.queues.is_empty())
    }

    /// Drive [`step`](Self::step) against the wall clock until every queue
    /// drains.
    pub fn run(&mut self, rt: &mut Runtime, source: &mut dyn EventSource) -> Result<()> {
        let start = Instant::now();
        loop {
            let now = start.elapsed().as_secs_f64();
            let events = source.poll();
            if !self.step(now, &events, rt)? {
                return Ok(());
            }
            std::thread::sleep(Duration::from_micros(500));
        }
    }

    /// Invoke the experiment watcher on one event. The watcher is lifted
    /// out for the call so it may replace itself through the context; it is
    /// restored only if it did not.
    fn run_watcher(&mut self, now: f64, event: &Event, rt: &mut Runtime) -> Result<()> {
        let Some(mut watcher) = rt.watcher.take() else {
            return Ok(());
        };
        let result = {
            let mut ctx = TrialCtx::new(now, rt);
            watcher(event, &mut ctx)
        };
        if rt.watcher.is_none() {
            rt.watcher = Some(watcher);
        }
        result
    }

    /// Deliver one event to the owner of the event-dispatch slot: the
    /// first queue whose head is a response moment. At most one response
    /// moment is current at a time by construction; with several, only the
    /// owner sees events.
    fn dispatch_event(&mut self, now: f64, event: &Event, rt: &mut Runtime) -> Result<()> {
        let Some(qi) = self
            .queues
            .iter()
            .position(|q| matches!(q.moments.front(), Some(Moment::Response { .. })))
        else {
            return Ok(());
        };

        let accepted = {
            let Some(Moment::Response { accept, .. }) = self.queues[qi].moments.front_mut()
            else {
                return Ok(());
            };
            let mut ctx = TrialCtx::new(now, rt);
            accept(event, &mut ctx)?
        };
        if !accepted {
            return Ok(());
        }

        let queue = &mut self.queues[qi];
        let Some(Moment::Response { atleast, .. }) = queue.moments.pop_front() else {
            return Ok(());
        };
        let elapsed = now - queue.last;
        if atleast > 0.0 && elapsed < atleast {
            // Hold the floor: the next moment may not start before
            // last + atleast.
            queue.moments.push_front(Moment::Timed {
                delta_t: atleast - elapsed,
                action: Box::new(|_| Ok(())),
            });
        }
        queue.last = now;
        Ok(())
    }

    /// Give one queue its handle step.
    fn dispatch_queue(&mut self, qi: usize, now: f64, rt: &mut Runtime) -> Result<()> {
        let last = self.queues[qi].last;
        let ready = match self.queues[qi].moments.front() {
            None => return Ok(()),
            Some(Moment::Timed { delta_t, .. }) => now >= last + delta_t,
            Some(Moment::Response { timeout, .. }) => {
                timeout.is_some_and(|t| now >= last + t)
            }
            Some(_) => true,
        };
        if !ready {
            return Ok(());
        }
        let Some(moment) = self.queues[qi].moments.pop_front() else {
            return Ok(());
        };

        match moment {
            Moment::Timed { mut action, .. } => {
                {
                    let mut ctx = TrialCtx::new(now, rt);
                    action(&mut ctx)?;
                }
                self.queues[qi].last = now;
            }

            Moment::OffsetStart { practice } => {
                rt.offset += 1;
                if !practice {
                    rt.trial += 1;
                }
                rt.watcher = None;
                let code = if practice {
                    "practice_start"
                } else {
                    "trial_start"
                };
                {
                    let mut ctx = TrialCtx::new(now, rt);
                    ctx.record(code, &[])?;
                }
                self.queues[qi].last = now;
            }

            Moment::Response { mut on_timeout, .. } => {
                // Reachable only through the timeout branch above.
                if let Some(action) = on_timeout.as_mut() {
                    let mut ctx = TrialCtx::new(now, rt);
                    action(&mut ctx)?;
                }
                self.queues[qi].last = now;
            }

            Moment::Compound { children } => {
                // The sub-queue starts at the enclosing moment's start.
                self.queues.push(MomentQueue::new(children, last));
            }

            Moment::Expanding { mut expand, looping } => {
                let body = {
                    let mut ctx = TrialCtx::new(now, rt);
                    expand(&mut ctx)?
                };
                if let Some(body) = body {
                    let queue = &mut self.queues[qi];
                    if looping {
                        queue.moments.push_front(Moment::Expanding { expand, looping });
                    }
                    for moment in body.into_iter().rev() {
                        queue.moments.push_front(moment);
                    }
                }
            }

            Moment::Final { action } => {
                let busy = (0..self.queues.len())
                    .find(|&qj| qj != qi && !self.queues[qj].is_empty());
                if let Some(qj) = busy {
                    // Someone still has work: wait at their tail.
                    self.queues[qj].moments.push_back(Moment::Final { action });
                } else {
                    let mut action = action;
                    {
                        let mut ctx = TrialCtx::new(now, rt);
                        action(&mut ctx)?;
                    }
                    self.queues[qi].last = now;
                }
            }
        }
        Ok(())
    }
}
