//! Trace-entry assembly (spec §4.6 "tracing and redaction"): turns one
//! [`StepOutcome`] plus its wall-clock duration into the `debugMode` trace
//! record, redacting any argument sourced from a `secret: true` parameter.

use std::collections::HashSet;
use std::time::Instant;

use sar_types::{Step, TraceEntry};
use serde_json::Value;

use crate::attempt::StepOutcome;
use crate::dispatch::step_action_name;
use crate::redact;

pub fn build_entry(step: &Step, index: usize, outcome: &StepOutcome, started_at: Instant, secret_params: &HashSet<String>) -> TraceEntry {
    let raw_args = Value::Object(step.args.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
    let args = redact::redact_args(&raw_args, &outcome.resolved_args, secret_params);
    let elapsed_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
    TraceEntry {
        index,
        step_action: step_action_name(step.action).to_string(),
        // `Instant` has no epoch, so the wall-clock timestamp is derived by
        // walking the monotonic elapsed duration back from "now" rather
        // than stamped at dispatch time — one fewer clock read per step.
        timestamp: chrono::Utc::now()
            - chrono::Duration::from_std(started_at.elapsed()).unwrap_or(chrono::Duration::zero()),
        elapsed_ms,
        success: outcome.error.is_none(),
        selector: outcome.selector_used.clone(),
        args,
        error: outcome.error.as_ref().map(|e| e.to_string()),
    }
}
