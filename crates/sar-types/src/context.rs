use indexmap::IndexMap;
use serde_json::Value;

use crate::selector::SelectorDef;

/// The pure-data portion of the execution context threaded through one
/// action invocation (spec §3). `sar-executor` wraps this with the
/// runtime-only pieces (wall-clock start time, cancellation signal) that
/// would otherwise pull an async runtime dependency into this crate.
#[derive(Debug, Clone)]
pub struct ExecutionContextSnapshot {
    /// Resolved parameter map after type coercion and defaults.
    pub params: Value,
    /// Read-only snapshot of named environment values exposed by the host.
    pub env: Value,
    /// Final selector alias table after version overrides.
    pub selectors: IndexMap<String, SelectorDef>,
    /// Step output, keyed by each step's declared `output` name.
    pub steps: IndexMap<String, Value>,
    /// Current recursion level, starting at 0 for a top-level invocation.
    pub depth: u32,
    pub action_timeout_ms: u64,
    pub step_timeout_ms: u64,
    pub debug_mode: bool,
    pub dry_run: bool,
}

impl ExecutionContextSnapshot {
    pub fn new(params: Value, env: Value, selectors: IndexMap<String, SelectorDef>) -> Self {
        Self {
            params,
            env,
            selectors,
            steps: IndexMap::new(),
            depth: 0,
            action_timeout_ms: crate::limits::DEFAULT_ACTION_TIMEOUT_MS,
            step_timeout_ms: crate::limits::DEFAULT_STEP_TIMEOUT_MS,
            debug_mode: false,
            dry_run: false,
        }
    }

    /// Look up a dotted path rooted at one of `params`, `env`, `selectors`,
    /// `steps`. Any other root, or a path walking through `__proto__`,
    /// `constructor`, or `prototype`, is rejected by the caller (the
    /// expression engine) before this is ever invoked — this method only
    /// performs the traversal itself.
    pub fn get_path(&self, root: &str, segments: &[&str]) -> Option<Value> {
        let (mut current, rest) = match root {
            "params" => (self.params.clone(), segments),
            "env" => (self.env.clone(), segments),
            "selectors" => {
                let value = match segments.first() {
                    Some(first) => self
                        .selectors
                        .get(*first)
                        .map(|def| Value::String(def.primary().to_string()))
                        .unwrap_or(Value::Null),
                    None => Value::Null,
                };
                (value, &segments[segments.len().min(1)..])
            }
            "steps" => {
                let value = match segments.first() {
                    Some(first) => self.steps.get(*first).cloned().unwrap_or(Value::Null),
                    None => Value::Null,
                };
                (value, &segments[segments.len().min(1)..])
            }
            _ => return None,
        };
        for seg in rest {
            current = match current {
                Value::Object(ref map) => map.get(*seg).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            };
        }
        Some(current)
    }
}

pub mod limits {
    pub const DEFAULT_MAX_DEPTH: u32 = 10;
    pub const DEFAULT_MAX_STEPS: u32 = 100;
    pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 30_000;
    pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 300_000;
}
