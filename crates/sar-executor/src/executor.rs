//! The top-level action lifecycle (spec §4.6): resolve the action, validate
//! its params, build the execution context, apply version detection and
//! selector overrides, run its steps, check `verify`, and assemble
//! `returns`. A `run` step recurses back into this same lifecycle one level
//! deeper, sharing the invocation tree's step-count budget and cancellation
//! signal but starting a fresh wall-clock timeout.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use sar_error::ActionError;
use sar_registry::Registry;
use sar_types::{ActionResult, DryRunResult, ExecutionContextSnapshot, TraceEntry};
use sar_version::VersionDetector;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::adapter::BrowserAdapter;
use crate::attempt::StepRunner;
use crate::context::{RuntimeContext, SharedRunState};
use crate::dispatch::DispatchOutcome;
use crate::limits::Limits;
use crate::plan;
use crate::trace;

/// What one `execute()` call produced: either a live result (with an
/// optional trace, present only in `debugMode`) or a dry-run plan. Kept
/// internal — `run()`/`dry_run()` unwrap the variant their caller asked for.
enum Outcome {
    Ran { data: Value, trace: Option<Vec<TraceEntry>> },
    Planned(Vec<sar_types::PlannedStep>),
}

/// Drives one [`BrowserAdapter`] against a [`Registry`] of action
/// definitions. Stateless beyond its configured resource budgets — every
/// call to [`Executor::run`] or [`Executor::dry_run`] is independent.
pub struct Executor<A: ?Sized> {
    registry: Arc<Registry>,
    limits: Limits,
    version_manager: sar_version::VersionManager,
    adapter: Arc<A>,
}

impl<A> Executor<A>
where
    A: BrowserAdapter + ?Sized,
{
    pub fn new(adapter: Arc<A>, registry: Arc<Registry>) -> Self {
        Self::with_limits(adapter, registry, Limits::default())
    }

    pub fn with_limits(adapter: Arc<A>, registry: Arc<Registry>, limits: Limits) -> Self {
        Self {
            registry,
            limits,
            version_manager: sar_version::VersionManager::new(),
            adapter,
        }
    }

    /// Run `action_name` to completion, never propagating an `Err` — any
    /// failure is folded into the returned [`ActionResult`]'s error field,
    /// matching the public `action.run` RPC contract (spec §6).
    ///
    /// `cancel`, when given, is an explicit abort signal (spec §5): the
    /// caller cancelling it stops the currently executing step's browser
    /// call without attempting any pending retry or fallback, the same way
    /// an exhausted action-wide timeout does.
    pub async fn run(
        &self,
        action_name: &str,
        params: Value,
        env: Value,
        detector: &dyn VersionDetector,
        debug_mode: bool,
        cancel: Option<CancellationToken>,
    ) -> ActionResult {
        match self
            .execute(action_name, params, env, detector, 0, SharedRunState::new(cancel), debug_mode, false)
            .await
        {
            Ok(Outcome::Ran { data, trace }) => {
                let result = ActionResult::success(data);
                match trace {
                    Some(entries) => result.with_trace(entries),
                    None => result,
                }
            }
            Ok(Outcome::Planned(_)) => unreachable!("a live run never produces a plan"),
            Err(err) => ActionResult::failure(err.to_record()),
        }
    }

    /// Plan `action_name`'s steps without ever touching the browser adapter
    /// (spec §4.6 "Dry-run"). Accepts the same explicit abort signal as
    /// [`Executor::run`] for a consistent cancellation surface, though a
    /// plan never suspends on anything cancellation would interrupt.
    pub async fn dry_run(
        &self,
        action_name: &str,
        params: Value,
        env: Value,
        detector: &dyn VersionDetector,
        cancel: Option<CancellationToken>,
    ) -> Result<DryRunResult, ActionError> {
        match self
            .execute(action_name, params, env, detector, 0, SharedRunState::new(cancel), false, true)
            .await?
        {
            Outcome::Planned(planned) => Ok(DryRunResult { success: true, planned }),
            Outcome::Ran { .. } => unreachable!("a dry run never performs a real run"),
        }
    }

    fn execute<'e>(
        &'e self,
        action_name: &str,
        raw_params: Value,
        env: Value,
        detector: &'e dyn VersionDetector,
        depth: u32,
        shared: SharedRunState,
        debug_mode: bool,
        dry_run: bool,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome, ActionError>> + 'e>> {
        // Copied eagerly so the returned future owns it outright, rather
        // than borrowing `action_name` for the whole recursive call tree.
        let action_name = action_name.to_string();
        Box::pin(async move {
            if depth > self.limits.max_depth {
                return Err(ActionError::max_depth_exceeded(self.limits.max_depth));
            }

            let snap = self.registry.snapshot();
            let mut full_name = action_name.clone();
            let mut action = snap
                .actions
                .get(&full_name)
                .cloned()
                .ok_or_else(|| ActionError::action_not_found(&full_name))?;

            let mut alias_hops = 0u8;
            while let Some(target) = action.alias_of.clone() {
                alias_hops += 1;
                if alias_hops > 8 {
                    return Err(ActionError::step_failed(
                        format!("alias_of chain starting at `{action_name}` is too long"),
                        None,
                    ));
                }
                full_name = target;
                action = snap
                    .actions
                    .get(&full_name)
                    .cloned()
                    .ok_or_else(|| ActionError::action_not_found(&full_name))?;
            }
            if action.deprecated {
                tracing::warn!(action = %full_name, "invoking a deprecated action");
            }

            let namespace = snap
                .namespaces
                .get(&action.namespace)
                .cloned()
                .ok_or_else(|| ActionError::action_not_found(&full_name))?;

            let mut selectors = namespace.selectors.clone();
            for (name, def) in &action.selectors {
                selectors.insert(name.clone(), def.clone());
            }

            if let Some(compat) = &namespace.compatibility {
                if let Some(detected) = self.version_manager.detect(compat, detector).await {
                    self.version_manager.check_range(&detected, compat)?;
                    let overrides = self.version_manager.resolve_overrides(&detected, compat)?;
                    for (name, def) in overrides {
                        selectors.insert(name, def);
                    }
                }
            }

            let effective_params = sar_schema::validate_params(&full_name, &action.params, &raw_params)?;
            let secret_params: HashSet<String> = action
                .params
                .iter()
                .filter(|(_, spec)| spec.secret)
                .map(|(name, _)| name.clone())
                .collect();

            let mut snapshot = ExecutionContextSnapshot::new(effective_params, env.clone(), selectors.clone());
            snapshot.depth = depth;
            snapshot.action_timeout_ms = self.limits.action_timeout_ms;
            snapshot.step_timeout_ms = self.limits.step_timeout_ms;
            snapshot.debug_mode = debug_mode;
            snapshot.dry_run = dry_run;

            let mut rt_ctx = RuntimeContext::new(snapshot, self.limits, shared.clone());

            if dry_run {
                let planned = plan::plan_steps(&action.steps, &rt_ctx, &selectors)?;
                return Ok(Outcome::Planned(planned));
            }

            let hook_env = env.clone();
            let hook_shared = shared.clone();
            let run_hook = move |resolved_args: Value, step_index: usize| -> Pin<Box<dyn Future<Output = Result<DispatchOutcome, ActionError>> + '_>> {
                let env = hook_env.clone();
                let shared = hook_shared.clone();
                Box::pin(async move {
                    let target = resolved_args
                        .get("action")
                        .and_then(Value::as_str)
                        .ok_or_else(|| ActionError::step_failed("run step is missing `action`", Some(step_index)))?
                        .to_string();
                    let nested_params = resolved_args.get("params").cloned().unwrap_or_else(|| Value::Object(Default::default()));
                    match self
                        .execute(&target, nested_params, env, detector, depth + 1, shared, debug_mode, false)
                        .await?
                    {
                        Outcome::Ran { data, .. } => Ok(DispatchOutcome { value: data, selector_used: None }),
                        Outcome::Planned(_) => unreachable!("a nested run is never dry-run"),
                    }
                })
            };

            let mut trace = Vec::new();
            for (index, step) in action.steps.iter().enumerate() {
                let started = Instant::now();
                let outcome = {
                    let runner = StepRunner {
                        adapter: self.adapter.as_ref(),
                        ctx: &rt_ctx,
                        selectors: &selectors,
                        run_hook: Some(&run_hook),
                    };
                    runner.attempt(step, index).await
                };

                if debug_mode {
                    trace.push(trace::build_entry(step, index, &outcome, started, &secret_params));
                }

                if let Some(output_name) = &step.output {
                    if let Some(value) = &outcome.value {
                        rt_ctx.snapshot.steps.insert(output_name.clone(), value.clone());
                    }
                }

                if let Some(err) = outcome.error {
                    if !outcome.skipped {
                        return Err(err);
                    }
                }
            }

            for entry in &action.verify {
                let ok = sar_expression::evaluate_condition(&entry.condition, &rt_ctx.snapshot)?;
                if !ok {
                    return Err(ActionError::verify_failed(entry.message.clone()));
                }
            }

            let mut data = serde_json::Map::with_capacity(action.returns.len());
            for (name, template) in &action.returns {
                data.insert(name.clone(), sar_expression::resolve(template, &rt_ctx.snapshot)?);
            }

            Ok(Outcome::Ran {
                data: Value::Object(data),
                trace: debug_mode.then_some(trace),
            })
        })
    }
}
