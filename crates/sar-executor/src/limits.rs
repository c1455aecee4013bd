//! The four budgets spec §5 enforces per invocation. `Limits` is
//! configuration (host-supplied, see `actions.max_depth` etc. in spec §6);
//! the running counters it bounds live on [`crate::context::RuntimeContext`].

/// Resource budgets for one top-level action invocation, shared by every
/// nested `run` beneath it (spec §3, §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_depth: u32,
    pub max_steps: u32,
    pub step_timeout_ms: u64,
    pub action_timeout_ms: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: sar_types::limits::DEFAULT_MAX_DEPTH,
            max_steps: sar_types::limits::DEFAULT_MAX_STEPS,
            step_timeout_ms: sar_types::limits::DEFAULT_STEP_TIMEOUT_MS,
            action_timeout_ms: sar_types::limits::DEFAULT_ACTION_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_spec_budgets() {
        let limits = Limits::default();
        assert_eq!(limits.max_depth, 10);
        assert_eq!(limits.max_steps, 100);
        assert_eq!(limits.step_timeout_ms, 30_000);
        assert_eq!(limits.action_timeout_ms, 300_000);
    }
}
