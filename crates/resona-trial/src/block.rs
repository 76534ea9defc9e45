//! Conditional and looping trial blocks.
//!
//! These builders expand to [`Moment::Expanding`], so the condition is
//! evaluated when the block is *dispatched*, not when the experiment is
//! built. That is the only correct way to branch on state mutated by
//! earlier moments: an ordinary `if` in the setup code would freeze the
//! decision before the first trial runs.

use crate::experiment::TrialCtx;
use crate::moment::Moment;
use crate::Result;

/// A dispatch-time condition.
pub type CondFn = Box<dyn FnMut(&mut TrialCtx<'_>) -> Result<bool> + 'static>;

/// A factory producing a fresh copy of a block body. Bodies are factories
/// rather than values because a looping block emits its body repeatedly
/// and moments own their closures.
pub type BodyFn = Box<dyn FnMut() -> Vec<Moment> + 'static>;

/// An unconditional block whose body is constructed at dispatch time.
pub fn block(mut body: impl FnMut() -> Vec<Moment> + 'static) -> Moment {
    Moment::Expanding {
        expand: Box::new(move |_ctx| Ok(Some(body()))),
        looping: false,
    }
}

/// Start an if/elseif/else chain: `when(cond, body)` runs `body` when
/// `cond` holds at dispatch time. Chain with
/// [`elsewhen`](Branches::elsewhen) and [`otherwise`](Branches::otherwise),
/// and finish with [`end`](Branches::end).
pub fn when(
    cond: impl FnMut(&mut TrialCtx<'_>) -> Result<bool> + 'static,
    body: impl FnMut() -> Vec<Moment> + 'static,
) -> Branches {
    Branches {
        arms: vec![(Box::new(cond), Box::new(body))],
        otherwise: None,
    }
}

/// A `while` block: re-evaluates `cond` after each pass of `body`.
pub fn repeat_while(
    mut cond: impl FnMut(&mut TrialCtx<'_>) -> Result<bool> + 'static,
    mut body: impl FnMut() -> Vec<Moment> + 'static,
) -> Moment {
    Moment::Expanding {
        expand: Box::new(move |ctx| Ok(if cond(ctx)? { Some(body()) } else { None })),
        looping: true,
    }
}

/// A partially built conditional chain; see [`when`].
pub struct Branches {
    arms: Vec<(CondFn, BodyFn)>,
    otherwise: Option<BodyFn>,
}

impl Branches {
    /// Add an else-if arm.
    pub fn elsewhen(
        mut self,
        cond: impl FnMut(&mut TrialCtx<'_>) -> Result<bool> + 'static,
        body: impl FnMut() -> Vec<Moment> + 'static,
    ) -> Self {
        self.arms.push((Box::new(cond), Box::new(body)));
        self
    }

    /// Add the else arm.
    pub fn otherwise(mut self, body: impl FnMut() -> Vec<Moment> + 'static) -> Self {
        self.otherwise = Some(Box::new(body));
        self
    }

    /// Finish the chain as a moment.
    pub fn end(self) -> Moment {
        let mut arms = self.arms;
        let mut otherwise = self.otherwise;
        Moment::Expanding {
            expand: Box::new(move |ctx| {
                for (cond, body) in arms.iter_mut() {
                    if cond(ctx)? {
                        return Ok(Some(body()));
                    }
                }
                Ok(otherwise.as_mut().map(|body| body()))
            }),
            looping: false,
        }
    }
}
