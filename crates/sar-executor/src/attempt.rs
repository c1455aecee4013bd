//! The per-step retry/fallback/onError state machine (spec §4.6): given one
//! step, try it, retry with backoff, fall back through `step.fallback`, then
//! apply `onError` if nothing else worked. The rules for what counts as a
//! "failure" to retry or fall back on are deliberately uniform across
//! top-level steps and fallback steps — a fallback entry is itself a full
//! [`Step`] and goes through this exact same machine recursively.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use indexmap::IndexMap;
use sar_error::ActionError;
use sar_types::{OnError, SelectorDef, Step, StepActionKind};
use serde_json::Value;

use crate::adapter::BrowserAdapter;
use crate::context::RuntimeContext;
use crate::dispatch::{self, DispatchError, DispatchOutcome};
use crate::resolver;
use crate::retry;

/// What happened to one step (or fallback entry) after the whole
/// retry/fallback/onError machine ran its course.
pub struct StepOutcome {
    pub value: Option<Value>,
    pub selector_used: Option<String>,
    pub resolved_args: Value,
    pub error: Option<ActionError>,
    pub skipped: bool,
}

impl StepOutcome {
    fn done(resolved_args: Value, outcome: DispatchOutcome) -> Self {
        Self {
            value: Some(outcome.value),
            selector_used: outcome.selector_used,
            resolved_args,
            error: None,
            skipped: false,
        }
    }

    fn skipped_clean() -> Self {
        Self {
            value: None,
            selector_used: None,
            resolved_args: Value::Null,
            error: None,
            skipped: true,
        }
    }

    fn skipped_with_error(resolved_args: Value, error: ActionError) -> Self {
        Self {
            value: None,
            selector_used: None,
            resolved_args,
            error: Some(error),
            skipped: true,
        }
    }

    fn failed(resolved_args: Value, error: ActionError) -> Self {
        Self {
            value: None,
            selector_used: None,
            resolved_args,
            error: Some(error),
            skipped: false,
        }
    }
}

/// A `run` step's resolved `{action, params}` body goes through this hook
/// rather than [`dispatch::dispatch`], since driving a nested action needs
/// the registry and version machinery `sar-executor`'s dispatch layer
/// deliberately doesn't know about (see `sar-daemon`'s `Executor`, the only
/// place that constructs one). Taking owned resolved args rather than `&Step`
/// keeps this free of the recursive future's lifetime relative to `self`.
pub type RunHook<'a> = dyn Fn(Value, usize) -> Pin<Box<dyn Future<Output = Result<DispatchOutcome, ActionError>> + 'a>> + 'a;

/// Runs steps against one adapter, inside one [`RuntimeContext`], for the
/// duration of a single action invocation (top-level or nested `run`).
/// Secret redaction of traced args is the caller's job (it needs the raw
/// step template, which [`StepOutcome::resolved_args`] already carries
/// alongside its interpolated counterpart).
pub struct StepRunner<'a, A: ?Sized> {
    pub adapter: &'a A,
    pub ctx: &'a RuntimeContext,
    pub selectors: &'a IndexMap<String, SelectorDef>,
    /// `None` when this runner can never see a `run` step (e.g. while
    /// attempting a fallback list that the caller knows is browser-only).
    pub run_hook: Option<&'a RunHook<'a>>,
}

impl<'a, A> StepRunner<'a, A>
where
    A: BrowserAdapter + ?Sized,
{
    /// Run `step` to completion: interpolation, `when`, dispatch, retry,
    /// fallback, `onError`, all per spec §4.6's pseudocode. Fallback entries
    /// recurse into this same method, so a fallback step's own `retry` and
    /// nested `fallback` are honored too.
    pub fn attempt<'b>(&'b self, step: &'b Step, step_index: usize) -> Pin<Box<dyn Future<Output = StepOutcome> + 'b>> {
        Box::pin(async move {
            match self.eval_when(step) {
                Ok(false) => return StepOutcome::skipped_clean(),
                Err(e) => return StepOutcome::failed(Value::Null, e),
                Ok(true) => {}
            }

            let mut attempt_index = 0u32;
            let mut last_resolved_args = Value::Null;
            let mut last_err;
            loop {
                if let Some(budget_err) = self.check_budgets(step_index) {
                    return StepOutcome::failed(last_resolved_args, budget_err);
                }
                let (resolved_args, result) = self.dispatch_once(step, step_index).await;
                last_resolved_args = resolved_args.clone();
                match result {
                    Ok(outcome) => return StepOutcome::done(resolved_args, outcome),
                    Err(e) => last_err = e,
                }
                if attempt_index < step.retry {
                    let base = step.retry_delay.unwrap_or(retry::DEFAULT_RETRY_DELAY_MS);
                    let delay = retry::backoff_delay_ms(base, attempt_index);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt_index += 1;
                    continue;
                }
                break;
            }

            if let Some(fallback) = &step.fallback {
                for fb_step in fallback {
                    let outcome = self.attempt(fb_step, step_index).await;
                    if outcome.error.is_none() && !outcome.skipped {
                        return outcome;
                    }
                    if let Some(e) = outcome.error {
                        last_err = e;
                    }
                }
            }

            match step.on_error {
                OnError::Continue => StepOutcome::skipped_with_error(last_resolved_args, last_err),
                OnError::Abort | OnError::Fallback => StepOutcome::failed(last_resolved_args, last_err),
            }
        })
    }

    fn eval_when(&self, step: &Step) -> Result<bool, ActionError> {
        match &step.when {
            None => Ok(true),
            Some(expr) => sar_expression::evaluate_condition(expr, &self.ctx.snapshot).map_err(ActionError::from),
        }
    }

    /// `maxSteps` and the action-wide timeout are checked before every
    /// dispatch attempt, including retries and fallback entries.
    fn check_budgets(&self, step_index: usize) -> Option<ActionError> {
        if let Err(e) = self.ctx.count_dispatched_step() {
            return Some(e);
        }
        if self.ctx.remaining_action_time().is_none() {
            // Fire the shared token so any step racing elsewhere in this
            // invocation tree (spec §5: the action-wide deadline terminates
            // the in-flight step, not just the ones that haven't started)
            // wakes immediately instead of waiting out its own timeout.
            self.ctx.shared.cancel.cancel();
            let elapsed_ms = u64::try_from(self.ctx.start.elapsed().as_millis()).unwrap_or(u64::MAX);
            return Some(ActionError::timeout(elapsed_ms, Some(step_index)));
        }
        None
    }

    async fn dispatch_once(&self, step: &Step, step_index: usize) -> (Value, Result<DispatchOutcome, ActionError>) {
        let raw_args = Value::Object(step.args.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        let resolved_args = match sar_expression::resolve_object(&raw_args, &self.ctx.snapshot) {
            Ok(v) => v,
            Err(e) => return (Value::Null, Err(ActionError::from(e))),
        };

        if step.action == StepActionKind::Fail {
            let message = resolved_args
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("explicit fail step")
                .to_string();
            return (resolved_args, Err(ActionError::step_failed(message, Some(step_index))));
        }

        let timeout_ms = self.ctx.effective_step_timeout_ms(step.timeout);

        if step.action == StepActionKind::Run {
            let outcome = match self.run_hook {
                Some(hook) => self.race(step_index, timeout_ms, hook(resolved_args.clone(), step_index)).await,
                None => Err(ActionError::step_failed("run step has no nested-run handler configured", Some(step_index))),
            };
            // A recursive `run` failure propagates as STEP_FAILED of the
            // invoking step, preserving the inner error as `details.cause`
            // (spec §7 propagation policy) — never the inner error's own
            // code (e.g. a bare MAX_DEPTH_EXCEEDED) bubbling straight up.
            let outcome = outcome.map_err(|cause| {
                ActionError::step_failed_with_cause(
                    format!("nested action invocation failed: {cause}"),
                    Some(step_index),
                    "run",
                    cause,
                )
            });
            return (resolved_args, outcome);
        }

        let selector_def = self.resolve_selector_def(step, &resolved_args);
        let call = dispatch::dispatch(self.adapter, step.action, &resolved_args, selector_def.as_ref());
        let outcome = self
            .race(step_index, timeout_ms, async {
                call.await
                    .map_err(|e| self.dispatch_error_to_action_error(e, selector_def.as_ref(), step_index))
            })
            .await;

        (resolved_args, outcome)
    }

    async fn race<F>(&self, step_index: usize, timeout_ms: u64, fut: F) -> Result<DispatchOutcome, ActionError>
    where
        F: Future<Output = Result<DispatchOutcome, ActionError>>,
    {
        tokio::select! {
            biased;
            _ = self.ctx.shared.cancel.cancelled() => {
                Err(ActionError::timeout(0, Some(step_index)))
            }
            result = tokio::time::timeout(Duration::from_millis(timeout_ms), fut) => {
                match result {
                    Ok(inner) => inner,
                    Err(_elapsed) => Err(ActionError::timeout(timeout_ms, Some(step_index))),
                }
            }
        }
    }

    /// A raw `selector` argument that is a whole-template reference to a
    /// declared alias keeps its fallback chain; anything else (a literal
    /// string, or a template producing one after interpolation) becomes a
    /// bare selector with no fallback.
    fn resolve_selector_def(&self, step: &Step, resolved_args: &Value) -> Option<SelectorDef> {
        let raw_selector = step.args.get("selector").and_then(Value::as_str);
        match raw_selector {
            Some(raw) => resolver::selector_def_for_arg(raw, self.selectors).or_else(|| {
                resolved_args
                    .get("selector")
                    .and_then(Value::as_str)
                    .map(|s| SelectorDef::Bare(s.to_string()))
            }),
            None => None,
        }
    }

    fn dispatch_error_to_action_error(&self, err: DispatchError, selector_def: Option<&SelectorDef>, step_index: usize) -> ActionError {
        match err {
            DispatchError::MissingArg(arg) => {
                ActionError::step_failed(format!("missing required argument `{arg}`"), Some(step_index))
            }
            DispatchError::Adapter(adapter_err) => {
                let selector = selector_def.map(SelectorDef::primary).unwrap_or_default();
                resolver::adapter_error_to_action_error(&adapter_err, selector, Some(step_index))
            }
        }
    }
}
