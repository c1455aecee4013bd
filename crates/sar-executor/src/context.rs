//! The runtime-only half of the execution context (spec §3): everything
//! [`sar_types::ExecutionContextSnapshot`] leaves out because it would pull
//! an async runtime or wall-clock dependency into the pure data-model
//! crate. One [`RuntimeContext`] is created per `execute()` call and
//! destroyed on return, exactly like the spec's context lifecycle — except
//! the step counter and cancellation token are *shared* across a whole
//! recursive `run` tree, because `maxSteps` is a budget for the entire
//! invocation, nested actions included (spec §3 invariants, §5).

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sar_error::ActionError;
use sar_types::ExecutionContextSnapshot;
use tokio_util::sync::CancellationToken;

use crate::limits::Limits;

/// State shared by a top-level invocation and every `run`-nested action
/// beneath it: the dispatched-step counter `maxSteps` bounds, and the
/// cancellation signal an outer timeout or explicit abort raises.
#[derive(Clone)]
pub struct SharedRunState {
    total_steps: Arc<AtomicU32>,
    pub cancel: CancellationToken,
}

impl SharedRunState {
    /// `external`, when given, becomes this run's cancellation parent: the
    /// caller cancelling it cancels every step racing anywhere in the
    /// invocation tree, while the tree's own cancellation (action-wide
    /// timeout) never reaches back out to the caller's token.
    pub fn new(external: Option<CancellationToken>) -> Self {
        let cancel = match external {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        Self {
            total_steps: Arc::new(AtomicU32::new(0)),
            cancel,
        }
    }
}

impl Default for SharedRunState {
    fn default() -> Self {
        Self::new(None)
    }
}

/// One invocation's full context: the pure-data [`ExecutionContextSnapshot`]
/// plus the runtime bookkeeping the executor needs around it.
pub struct RuntimeContext {
    pub snapshot: ExecutionContextSnapshot,
    pub limits: Limits,
    pub start: Instant,
    pub shared: SharedRunState,
}

impl RuntimeContext {
    pub fn new(snapshot: ExecutionContextSnapshot, limits: Limits, shared: SharedRunState) -> Self {
        Self {
            snapshot,
            limits,
            start: Instant::now(),
            shared,
        }
    }

    /// Record one dispatched step (initial attempt, retry, fallback branch,
    /// or nested `run` entry), failing with `STEP_FAILED` once the shared
    /// `maxSteps` budget for the whole invocation tree is exhausted.
    pub fn count_dispatched_step(&self) -> Result<(), ActionError> {
        let prev = self.shared.total_steps.fetch_add(1, Ordering::SeqCst);
        if prev >= self.limits.max_steps {
            return Err(ActionError::step_failed(
                format!("exceeded maxSteps budget of {}", self.limits.max_steps),
                None,
            ));
        }
        Ok(())
    }

    /// Time remaining before the action-wide timeout, or `None` if already
    /// past it.
    pub fn remaining_action_time(&self) -> Option<Duration> {
        let budget = Duration::from_millis(self.limits.action_timeout_ms);
        budget.checked_sub(self.start.elapsed())
    }

    /// The step's own (or default) timeout, clamped to whatever is left of
    /// the action-wide budget — otherwise a step whose timeout outlives the
    /// action deadline would let `race()` run the in-flight browser call
    /// straight past it (spec §4.6 "Timeouts": the action-wide deadline
    /// terminates the in-flight step cooperatively, not just the ones that
    /// start after it).
    pub fn effective_step_timeout_ms(&self, step_timeout: Option<u64>) -> u64 {
        let requested = step_timeout.unwrap_or(self.limits.step_timeout_ms);
        let remaining_ms = self
            .remaining_action_time()
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        requested.min(remaining_ms)
    }
}
