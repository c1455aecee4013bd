//! Cross-namespace semantic rules (spec §4.2, rules 4-5): these need the
//! full merged action index, so unlike [`crate::semantic`] they run once —
//! in `sar-registry`, after every namespace has been loaded and merged —
//! rather than per file.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use sar_types::{Action, Step};

use crate::issue::{IssueCode, ValidationIssue};

/// Flag every `aliasOf` that points at a target missing from the registry,
/// or at a target that is itself deprecated.
pub fn check_alias_targets(actions: &IndexMap<String, Action>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for (full_name, action) in actions {
        let Some(target) = &action.alias_of else { continue };
        let path = format!("{full_name}.aliasOf");
        match actions.get(target) {
            None => issues.push(ValidationIssue::new(
                &path,
                IssueCode::DanglingAliasOf,
                format!("`{full_name}` aliases `{target}`, which does not exist"),
            )),
            Some(t) if t.deprecated => issues.push(ValidationIssue::new(
                &path,
                IssueCode::AliasOfDeprecatedTarget,
                format!("`{full_name}` aliases deprecated action `{target}`"),
            )),
            Some(_) => {}
        }
    }
    issues
}

/// Flag any action whose fallback chains, followed through `run` steps,
/// can re-enter an action already on the current call stack.
///
/// This is a static approximation: it doesn't evaluate `when` conditions,
/// so a cycle that can only occur under a condition that's always false at
/// runtime is still reported. That's intentional — the check exists to
/// catch infinite-recursion *definitions*, not to prove reachability.
pub fn check_fallback_cycles(actions: &IndexMap<String, Action>) -> Vec<ValidationIssue> {
    let mut edges: HashMap<&str, HashSet<&str>> = HashMap::new();
    for (full_name, action) in actions {
        let mut targets = HashSet::new();
        for step in &action.steps {
            collect_run_targets(step, &mut targets);
        }
        edges.insert(full_name.as_str(), targets);
    }

    let mut issues = Vec::new();
    let mut globally_cleared: HashSet<&str> = HashSet::new();
    for start in actions.keys() {
        if globally_cleared.contains(start.as_str()) {
            continue;
        }
        let mut stack = vec![start.as_str()];
        let mut on_stack: HashSet<&str> = HashSet::from([start.as_str()]);
        if let Some(cycle) = dfs(start.as_str(), &edges, &mut stack, &mut on_stack) {
            issues.push(ValidationIssue::new(
                format!("{start}.steps"),
                IssueCode::FallbackCycle,
                format!("recursive `run` cycle: {}", cycle.join(" -> ")),
            ));
        } else {
            globally_cleared.insert(start.as_str());
        }
    }
    issues
}

fn dfs<'a>(
    node: &'a str,
    edges: &HashMap<&'a str, HashSet<&'a str>>,
    stack: &mut Vec<&'a str>,
    on_stack: &mut HashSet<&'a str>,
) -> Option<Vec<String>> {
    let Some(targets) = edges.get(node) else {
        return None;
    };
    for &next in targets {
        if on_stack.contains(next) {
            let mut cycle: Vec<String> = stack.iter().map(|s| (*s).to_string()).collect();
            cycle.push(next.to_string());
            return Some(cycle);
        }
        stack.push(next);
        on_stack.insert(next);
        if let Some(cycle) = dfs(next, edges, stack, on_stack) {
            return Some(cycle);
        }
        stack.pop();
        on_stack.remove(next);
    }
    None
}

/// Collect the `action` argument of every `run` step reachable from `step`,
/// including its fallback chain.
fn collect_run_targets<'a>(step: &'a Step, out: &mut HashSet<&'a str>) {
    if matches!(step.action, sar_types::StepActionKind::Run) {
        if let Some(target) = step.args.get("action").and_then(|v| v.as_str()) {
            out.insert(target);
        }
    }
    if let Some(fallback) = &step.fallback {
        for fb in fallback {
            collect_run_targets(fb, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn action(name: &str, description: &str) -> Action {
        Action {
            name: name.to_string(),
            namespace: "test".to_string(),
            full_name: format!("test:{name}"),
            source_path: None,
            description: description.to_string(),
            since: None,
            deprecated: false,
            alias_of: None,
            params: IndexMap::new(),
            selectors: IndexMap::new(),
            steps: Vec::new(),
            returns: IndexMap::new(),
            verify: Vec::new(),
        }
    }

    fn run_step(target: &str) -> Step {
        let mut args = IndexMap::new();
        args.insert("action".to_string(), json!(target));
        Step {
            action: sar_types::StepActionKind::Run,
            args,
            when: None,
            output: None,
            timeout: None,
            retry: 0,
            retry_delay: None,
            on_error: sar_types::OnError::Abort,
            fallback: None,
        }
    }

    #[test]
    fn flags_dangling_alias_of() {
        let mut a = action("a", "a");
        a.alias_of = Some("test:missing".to_string());
        let mut actions = IndexMap::new();
        actions.insert("test:a".to_string(), a);
        let issues = check_alias_targets(&actions);
        assert!(issues.iter().any(|i| i.code == IssueCode::DanglingAliasOf));
    }

    #[test]
    fn flags_alias_of_deprecated_target() {
        let mut a = action("a", "a");
        a.alias_of = Some("test:b".to_string());
        let mut b = action("b", "b");
        b.deprecated = true;
        let mut actions = IndexMap::new();
        actions.insert("test:a".to_string(), a);
        actions.insert("test:b".to_string(), b);
        let issues = check_alias_targets(&actions);
        assert!(issues
            .iter()
            .any(|i| i.code == IssueCode::AliasOfDeprecatedTarget));
    }

    #[test]
    fn accepts_valid_non_deprecated_alias() {
        let mut a = action("a", "a");
        a.alias_of = Some("test:b".to_string());
        let b = action("b", "b");
        let mut actions = IndexMap::new();
        actions.insert("test:a".to_string(), a);
        actions.insert("test:b".to_string(), b);
        assert_eq!(check_alias_targets(&actions), vec![]);
    }

    #[test]
    fn flags_direct_self_recursion() {
        let mut a = action("a", "a");
        a.steps = vec![run_step("test:a")];
        let mut actions = IndexMap::new();
        actions.insert("test:a".to_string(), a);
        let issues = check_fallback_cycles(&actions);
        assert!(issues.iter().any(|i| i.code == IssueCode::FallbackCycle));
    }

    #[test]
    fn flags_cycle_through_fallback_run_step() {
        let mut a = action("a", "a");
        let mut click = Step {
            action: sar_types::StepActionKind::Click,
            args: IndexMap::new(),
            when: None,
            output: None,
            timeout: None,
            retry: 0,
            retry_delay: None,
            on_error: sar_types::OnError::Fallback,
            fallback: Some(vec![run_step("test:b")]),
        };
        click.args.insert("selector".to_string(), json!("#x"));
        a.steps = vec![click];
        let mut b = action("b", "b");
        b.steps = vec![run_step("test:a")];
        let mut actions = IndexMap::new();
        actions.insert("test:a".to_string(), a);
        actions.insert("test:b".to_string(), b);
        let issues = check_fallback_cycles(&actions);
        assert!(issues.iter().any(|i| i.code == IssueCode::FallbackCycle));
    }

    #[test]
    fn accepts_acyclic_run_chain() {
        let mut a = action("a", "a");
        a.steps = vec![run_step("test:b")];
        let b = action("b", "b");
        let mut actions = IndexMap::new();
        actions.insert("test:a".to_string(), a);
        actions.insert("test:b".to_string(), b);
        assert_eq!(check_fallback_cycles(&actions), vec![]);
    }
}
