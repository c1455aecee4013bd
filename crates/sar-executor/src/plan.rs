//! Dry-run planning (spec §4.6 "Dry-run"): interpolation, `when` evaluation
//! and selector-alias resolution run exactly as a live execution would, but
//! no step ever reaches the browser adapter. A `run`/`fail` step is planned
//! like any other step — its resolved `{action, params}` body is reported,
//! it is not recursively expanded into the nested action's own plan.

use indexmap::IndexMap;
use sar_error::ActionError;
use sar_types::{PlannedStep, SelectorDef, Step};
use serde_json::Value;

use crate::context::RuntimeContext;
use crate::dispatch::step_action_name;
use crate::resolver;

pub fn plan_steps(
    steps: &[Step],
    ctx: &RuntimeContext,
    selectors: &IndexMap<String, SelectorDef>,
) -> Result<Vec<PlannedStep>, ActionError> {
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| plan_one(step, index, ctx, selectors))
        .collect()
}

fn plan_one(
    step: &Step,
    index: usize,
    ctx: &RuntimeContext,
    selectors: &IndexMap<String, SelectorDef>,
) -> Result<PlannedStep, ActionError> {
    let runs = match &step.when {
        None => true,
        Some(expr) => sar_expression::evaluate_condition(expr, &ctx.snapshot)?,
    };

    if !runs {
        return Ok(PlannedStep {
            index,
            step_action: step_action_name(step.action).to_string(),
            resolved_args: Value::Null,
            skipped: Some(true),
        });
    }

    let raw_args = Value::Object(step.args.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
    let resolved_args = sar_expression::resolve_object(&raw_args, &ctx.snapshot)?;

    // Touch the alias table the same way a live dispatch would, so an
    // unresolvable `${selectors.x}` reference surfaces during planning too.
    if let Some(raw) = step.args.get("selector").and_then(Value::as_str) {
        let _ = resolver::selector_def_for_arg(raw, selectors);
    }

    Ok(PlannedStep {
        index,
        step_action: step_action_name(step.action).to_string(),
        resolved_args,
        skipped: None,
    })
}
