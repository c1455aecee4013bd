//! Semantic rules 1-3 (spec §4.2): variable reference scoping, step-output
//! ordering, and condition-expression syntax — all checkable from a single
//! action's own definition, without needing the merged registry.
//!
//! Rules 4 and 5 (fallback cycle detection, `aliasOf` target existence) need
//! the full merged action index and live in [`crate::graph`], run by
//! `sar-registry` once namespaces are merged.

use std::collections::HashSet;

use indexmap::IndexMap;
use sar_types::{Action, SelectorDef, Step};
use serde_json::Value;

use crate::issue::{IssueCode, ValidationIssue};

/// Every template reference and condition expression reachable from one
/// action, checked against that action's own parameter schema, step
/// outputs, and a caller-supplied selector name set (the namespace's own
/// selectors plus any local to the action — see [`crate::validate_file`]
/// for why the caller, not this function, decides which selectors are in
/// scope).
pub fn check_action(action: &Action, available_selectors: &HashSet<&str>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let param_names: HashSet<&str> = action.params.keys().map(String::as_str).collect();

    let mut seen_outputs: HashSet<&str> = HashSet::new();
    for (i, step) in action.steps.iter().enumerate() {
        check_step(
            step,
            &format!("actions.{}.steps[{i}]", action.name),
            &param_names,
            available_selectors,
            &seen_outputs,
            &mut issues,
        );
        if let Some(output) = &step.output {
            seen_outputs.insert(output.as_str());
        }
    }

    for (name, template) in &action.returns {
        check_templates_in_str(
            template,
            &format!("actions.{}.returns.{name}", action.name),
            &param_names,
            available_selectors,
            &seen_outputs,
            &mut issues,
        );
    }

    for (i, verify) in action.verify.iter().enumerate() {
        let path = format!("actions.{}.verify[{i}].condition", action.name);
        check_templates_in_str(
            &verify.condition,
            &path,
            &param_names,
            available_selectors,
            &seen_outputs,
            &mut issues,
        );
        check_condition_syntax(&verify.condition, &path, &mut issues);
    }

    issues
}

#[allow(clippy::too_many_arguments)]
fn check_step(
    step: &Step,
    path: &str,
    param_names: &HashSet<&str>,
    available_selectors: &HashSet<&str>,
    seen_outputs: &HashSet<&str>,
    issues: &mut Vec<ValidationIssue>,
) {
    for (key, value) in &step.args {
        check_templates_in_value(
            value,
            &format!("{path}.args.{key}"),
            param_names,
            available_selectors,
            seen_outputs,
            issues,
        );
    }
    if let Some(when) = &step.when {
        let when_path = format!("{path}.when");
        check_templates_in_str(when, &when_path, param_names, available_selectors, seen_outputs, issues);
        check_condition_syntax(when, &when_path, issues);
    }
    if let Some(fallback) = &step.fallback {
        // Fallback steps run after the primary in the same scope: any
        // `output` the primary step would have produced is not yet
        // available to them (the primary failed), but earlier siblings'
        // outputs still are.
        for (i, fb) in fallback.iter().enumerate() {
            check_step(
                fb,
                &format!("{path}.fallback[{i}]"),
                param_names,
                available_selectors,
                seen_outputs,
                issues,
            );
        }
    }
}

fn check_templates_in_value(
    value: &Value,
    path: &str,
    param_names: &HashSet<&str>,
    available_selectors: &HashSet<&str>,
    seen_outputs: &HashSet<&str>,
    issues: &mut Vec<ValidationIssue>,
) {
    match value {
        Value::String(s) => {
            check_templates_in_str(s, path, param_names, available_selectors, seen_outputs, issues)
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                check_templates_in_value(
                    item,
                    &format!("{path}[{i}]"),
                    param_names,
                    available_selectors,
                    seen_outputs,
                    issues,
                );
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                check_templates_in_value(
                    v,
                    &format!("{path}.{k}"),
                    param_names,
                    available_selectors,
                    seen_outputs,
                    issues,
                );
            }
        }
        _ => {}
    }
}

fn check_templates_in_str(
    text: &str,
    path: &str,
    param_names: &HashSet<&str>,
    available_selectors: &HashSet<&str>,
    seen_outputs: &HashSet<&str>,
    issues: &mut Vec<ValidationIssue>,
) {
    let Ok(placeholders) = sar_expression::extract_placeholder_paths(text) else {
        // Lexical errors in the placeholder itself are real problems, but
        // they're surfaced precisely by `check_condition_syntax` for `when`
        // and `verify` text; for plain interpolation templates a malformed
        // `${` is still worth flagging here.
        issues.push(ValidationIssue::new(
            path,
            IssueCode::ExpressionSyntax,
            "malformed ${...} placeholder",
        ));
        return;
    };
    for (body, _offset) in placeholders {
        let Ok(parsed) = sar_expression::path::parse_path(&body, 0) else {
            issues.push(ValidationIssue::new(
                path,
                IssueCode::UnknownVariableRoot,
                format!("`${{{body}}}` is not a valid variable reference"),
            ));
            continue;
        };
        let Some(first) = parsed.segments.first() else {
            continue;
        };
        match parsed.root.as_str() {
            "params" if !param_names.contains(first.as_str()) => {
                issues.push(ValidationIssue::new(
                    path,
                    IssueCode::UnknownParamReference,
                    format!("`params.{first}` is not declared in this action's parameter schema"),
                ));
            }
            "selectors" if !available_selectors.contains(first.as_str()) => {
                issues.push(ValidationIssue::new(
                    path,
                    IssueCode::UnknownSelectorReference,
                    format!("`selectors.{first}` is not in the namespace's selector table"),
                ));
            }
            "steps" if !seen_outputs.contains(first.as_str()) => {
                issues.push(ValidationIssue::new(
                    path,
                    IssueCode::UnknownStepReference,
                    format!(
                        "`steps.{first}` does not name an earlier step's `output`"
                    ),
                ));
            }
            _ => {}
        }
    }
}

/// Parse `text` through the condition grammar after replacing every
/// placeholder with a `null` literal stand-in, surfacing pure grammar
/// errors (mismatched parens, forbidden constructs, depth overflow)
/// independent of what the interpolated values will be at runtime.
fn check_condition_syntax(text: &str, path: &str, issues: &mut Vec<ValidationIssue>) {
    let Ok(spans) = sar_expression::placeholder_spans(text) else {
        issues.push(ValidationIssue::new(
            path,
            IssueCode::ExpressionSyntax,
            "malformed ${...} placeholder",
        ));
        return;
    };
    let mut stand_in = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for (start, end) in spans {
        stand_in.push_str(&text[cursor..start]);
        stand_in.push_str("null");
        cursor = end;
    }
    stand_in.push_str(&text[cursor..]);

    if let Err(e) = sar_expression::token::tokenize(&stand_in) {
        issues.push(ValidationIssue::new(
            path,
            IssueCode::ExpressionSyntax,
            format!("{}", e.kind),
        ));
        return;
    }
    let tokens = sar_expression::token::tokenize(&stand_in).expect("checked above");
    if let Err(e) = sar_expression::parser::parse(&tokens) {
        issues.push(ValidationIssue::new(
            path,
            IssueCode::ExpressionSyntax,
            format!("{}", e.kind),
        ));
    }
}

/// Build the set of selector names visible to `action`: the namespace's own
/// table plus any local override/addition declared on the action itself.
pub fn visible_selectors<'a>(
    namespace_selectors: &'a IndexMap<String, SelectorDef>,
    action: &'a Action,
) -> HashSet<&'a str> {
    namespace_selectors
        .keys()
        .chain(action.selectors.keys())
        .map(String::as_str)
        .collect()
}
