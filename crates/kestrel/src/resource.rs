//! Execution bounds for symbolic evaluation.
//!
//! Symbolic execution explores every branch, so nontermination is the
//! default failure mode rather than an edge case. Three independent bounds
//! keep it finite:
//!
//! - a **call-depth limit** (default 4096) that turns runaway descent into
//!   an infinite-recursion error instead of a host stack overflow,
//! - an optional **step budget** counting evaluated nodes, a coarse
//!   whole-run timeout that needs no clock,
//! - a **re-entry bound**: re-entering a function already on the stack with
//!   a structurally equivalent argument shape short-circuits to a symbolic
//!   result instead of descending again.
//!
//! Limits are configured with a builder ([`EvalLimits`]) and enforced by a
//! [`StepTracker`] owned by the evaluator. Hosts can also cancel a run
//! cooperatively through a shared [`CancelToken`]; the core checks it at
//! function-application boundaries, and intrinsics and scanners are
//! expected to honor it during long work.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// Call-stack depth limit applied when none is configured.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

/// How many structurally-equivalent re-entries of the same call site are
/// evaluated before the evaluator answers with a placeholder.
pub const DEFAULT_MAX_REENTRY: u32 = 1;

/// Depth limit for chains of variable indirection during forced evaluation.
pub const MAX_VARIABLE_DEPTH: usize = 64;

/// Error raised when an execution bound is exceeded.
#[derive(Debug, Clone)]
pub enum LimitError {
    /// The step budget ran out.
    Steps { limit: u64, steps: u64 },
    /// A call would exceed the depth limit.
    Depth { limit: usize, depth: usize },
    /// The host cancelled the run.
    Cancelled,
}

impl fmt::Display for LimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Steps { limit, steps } => {
                write!(f, "max steps exceeded: {steps} > {limit}")
            }
            Self::Depth { limit, .. } => {
                write!(f, "infinite recursion detected: call depth exceeds {limit}")
            }
            Self::Cancelled => f.write_str("evaluation cancelled"),
        }
    }
}

impl std::error::Error for LimitError {}

/// Configuration for evaluation bounds.
///
/// All knobs have workable defaults; use the builder methods to adjust.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EvalLimits {
    /// Maximum call-stack depth before an infinite-recursion error.
    pub max_call_depth: usize,
    /// Maximum number of evaluated AST nodes, `None` for unbounded.
    pub max_steps: Option<u64>,
    /// Structurally-equal re-entries of one call site evaluated before
    /// short-circuiting.
    pub max_reentry: u32,
    /// Cache side-effect-free call results keyed by declaration position.
    pub memoize: bool,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_steps: None,
            max_reentry: DEFAULT_MAX_REENTRY,
            memoize: false,
        }
    }
}

impl EvalLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the call-stack depth limit.
    #[must_use]
    pub fn max_call_depth(mut self, limit: usize) -> Self {
        self.max_call_depth = limit;
        self
    }

    /// Sets the step budget.
    #[must_use]
    pub fn max_steps(mut self, limit: u64) -> Self {
        self.max_steps = Some(limit);
        self
    }

    /// Sets how many structurally-equal re-entries are evaluated.
    #[must_use]
    pub fn max_reentry(mut self, limit: u32) -> Self {
        self.max_reentry = limit;
        self
    }

    /// Enables memoization of side-effect-free calls.
    #[must_use]
    pub fn memoize(mut self, enabled: bool) -> Self {
        self.memoize = enabled;
        self
    }
}

/// Enforces [`EvalLimits`] over one evaluator's lifetime.
#[derive(Debug)]
pub struct StepTracker {
    limits: EvalLimits,
    steps: u64,
}

impl StepTracker {
    #[must_use]
    pub fn new(limits: EvalLimits) -> Self {
        Self { limits, steps: 0 }
    }

    /// Counts one evaluated node against the step budget.
    pub fn on_step(&mut self) -> Result<(), LimitError> {
        self.steps += 1;
        if let Some(limit) = self.limits.max_steps
            && self.steps > limit
        {
            return Err(LimitError::Steps {
                limit,
                steps: self.steps,
            });
        }
        Ok(())
    }

    /// Checks that one more call frame fits under the depth limit.
    /// `current_depth` is the depth before the push.
    pub fn check_depth(&self, current_depth: usize) -> Result<(), LimitError> {
        if current_depth >= self.limits.max_call_depth {
            return Err(LimitError::Depth {
                limit: self.limits.max_call_depth,
                depth: current_depth + 1,
            });
        }
        Ok(())
    }

    /// Total nodes evaluated so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[must_use]
    pub fn limits(&self) -> &EvalLimits {
        &self.limits
    }
}

/// Cooperative cancellation flag shared between a host and an evaluator.
///
/// Cloning shares the flag. Cancellation is one-way and sticky.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags the run as cancelled. Safe to call from another thread.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Returns `Err(LimitError::Cancelled)` once the token is flagged.
    pub fn check(&self) -> Result<(), LimitError> {
        if self.is_cancelled() {
            Err(LimitError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_budget_trips_after_limit() {
        let mut tracker = StepTracker::new(EvalLimits::new().max_steps(2));
        assert!(tracker.on_step().is_ok());
        assert!(tracker.on_step().is_ok());
        assert!(matches!(
            tracker.on_step(),
            Err(LimitError::Steps { limit: 2, steps: 3 })
        ));
    }

    #[test]
    fn depth_check_is_exclusive() {
        let tracker = StepTracker::new(EvalLimits::new().max_call_depth(3));
        assert!(tracker.check_depth(2).is_ok());
        assert!(matches!(
            tracker.check_depth(3),
            Err(LimitError::Depth { limit: 3, depth: 4 })
        ));
    }

    #[test]
    fn cancel_token_is_shared_and_sticky() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(matches!(token.check(), Err(LimitError::Cancelled)));
        assert!(clone.is_cancelled());
    }

    #[test]
    fn limits_builder_round_trips() {
        let limits = EvalLimits::new()
            .max_call_depth(128)
            .max_steps(10_000)
            .max_reentry(2)
            .memoize(true);
        assert_eq!(limits.max_call_depth, 128);
        assert_eq!(limits.max_steps, Some(10_000));
        assert_eq!(limits.max_reentry, 2);
        assert!(limits.memoize);
    }
}
