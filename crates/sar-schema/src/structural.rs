//! Structural rules (spec §4.2): the shape of a YAML source file before any
//! cross-reference or expression-grammar check runs.
//!
//! These checks walk the generic [`serde_yaml::Value`] rather than the typed
//! [`sar_types::NamespaceFile`] model, so a malformed file produces a full
//! list of precise issues instead of one opaque serde error — serde would
//! otherwise bail at the first field it can't deserialize.

use serde_yaml::Value;

use crate::issue::{IssueCode, ValidationIssue};

const VALID_STEP_ACTIONS: [&str; 11] = [
    "open", "click", "fill", "type", "press", "wait", "snapshot", "find", "eval", "run", "fail",
];
const VALID_PARAM_TYPES: [&str; 6] = ["string", "number", "boolean", "enum", "array", "object"];
const VALID_ON_ERROR: [&str; 3] = ["continue", "abort", "fallback"];

/// Run every structural rule over the raw document, accumulating issues
/// rather than stopping at the first.
pub fn check(doc: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let Some(map) = doc.as_mapping() else {
        issues.push(ValidationIssue::new(
            "$",
            IssueCode::MissingField,
            "document root must be a mapping",
        ));
        return issues;
    };

    check_schema_version(map, &mut issues);
    check_namespace(map, &mut issues);
    check_version(map, &mut issues);
    check_actions(map, &mut issues);
    issues
}

fn get<'a>(map: &'a serde_yaml::Mapping, key: &str) -> Option<&'a Value> {
    map.get(Value::String(key.to_string()))
}

fn check_schema_version(map: &serde_yaml::Mapping, issues: &mut Vec<ValidationIssue>) {
    match get(map, "schema_version").and_then(Value::as_u64) {
        Some(1) => {}
        Some(other) => issues.push(ValidationIssue::new(
            "schema_version",
            IssueCode::InvalidSchemaVersion,
            format!("unsupported schema_version {other}, expected 1"),
        )),
        None => issues.push(ValidationIssue::new(
            "schema_version",
            IssueCode::MissingField,
            "schema_version is required",
        )),
    }
}

fn check_namespace(map: &serde_yaml::Mapping, issues: &mut Vec<ValidationIssue>) {
    match get(map, "namespace").and_then(Value::as_str) {
        Some(name) if is_valid_identifier(name) => {}
        Some(name) => issues.push(ValidationIssue::new(
            "namespace",
            IssueCode::InvalidIdentifier,
            format!("`{name}` must match [a-z][a-z0-9_-]*"),
        )),
        None => issues.push(ValidationIssue::new(
            "namespace",
            IssueCode::MissingField,
            "namespace is required and must be non-empty",
        )),
    }
}

fn check_version(map: &serde_yaml::Mapping, issues: &mut Vec<ValidationIssue>) {
    match get(map, "version").and_then(Value::as_str) {
        Some(v) if semver::Version::parse(v).is_ok() => {}
        Some(v) => issues.push(ValidationIssue::new(
            "version",
            IssueCode::InvalidSemver,
            format!("`{v}` is not a valid semver version"),
        )),
        None => issues.push(ValidationIssue::new(
            "version",
            IssueCode::MissingField,
            "version is required",
        )),
    }
}

fn check_actions(map: &serde_yaml::Mapping, issues: &mut Vec<ValidationIssue>) {
    let Some(actions) = get(map, "actions").and_then(Value::as_mapping) else {
        issues.push(ValidationIssue::new(
            "actions",
            IssueCode::MissingField,
            "actions map is required",
        ));
        return;
    };
    for (name, action) in actions {
        let Some(name) = name.as_str() else { continue };
        let path = format!("actions.{name}");
        let Some(action) = action.as_mapping() else {
            issues.push(ValidationIssue::new(
                path,
                IssueCode::MissingField,
                "action body must be a mapping",
            ));
            continue;
        };
        check_description(action, &path, issues);
        check_steps(action, &path, issues);
        check_params(action, &path, issues);
    }
}

fn check_description(action: &serde_yaml::Mapping, path: &str, issues: &mut Vec<ValidationIssue>) {
    match get(action, "description").and_then(Value::as_str) {
        Some(d) if !d.trim().is_empty() => {}
        _ => issues.push(ValidationIssue::new(
            format!("{path}.description"),
            IssueCode::EmptyDescription,
            "description must be non-empty",
        )),
    }
}

fn check_steps(action: &serde_yaml::Mapping, path: &str, issues: &mut Vec<ValidationIssue>) {
    match get(action, "steps").and_then(Value::as_sequence) {
        Some(steps) if !steps.is_empty() => {
            for (i, step) in steps.iter().enumerate() {
                check_step(step, &format!("{path}.steps[{i}]"), issues);
            }
        }
        _ => issues.push(ValidationIssue::new(
            format!("{path}.steps"),
            IssueCode::EmptySteps,
            "steps must be a non-empty list",
        )),
    }
}

fn check_step(step: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    let Some(map) = step.as_mapping() else {
        issues.push(ValidationIssue::new(
            path,
            IssueCode::MissingField,
            "step body must be a mapping",
        ));
        return;
    };
    match get(map, "action").and_then(Value::as_str) {
        Some(a) if VALID_STEP_ACTIONS.contains(&a) => {}
        Some(a) => issues.push(ValidationIssue::new(
            format!("{path}.action"),
            IssueCode::UnknownStepAction,
            format!("`{a}` is not a recognized step action"),
        )),
        None => issues.push(ValidationIssue::new(
            format!("{path}.action"),
            IssueCode::MissingField,
            "step action is required",
        )),
    }
    if let Some(on_error) = get(map, "onError").and_then(Value::as_str) {
        if !VALID_ON_ERROR.contains(&on_error) {
            issues.push(ValidationIssue::new(
                format!("{path}.onError"),
                IssueCode::MissingField,
                format!("`{on_error}` is not one of continue|abort|fallback"),
            ));
        }
    }
    if let Some(fallback) = get(map, "fallback").and_then(Value::as_sequence) {
        for (i, fb) in fallback.iter().enumerate() {
            check_step(fb, &format!("{path}.fallback[{i}]"), issues);
        }
    }
}

fn check_params(action: &serde_yaml::Mapping, path: &str, issues: &mut Vec<ValidationIssue>) {
    let Some(params) = get(action, "params").and_then(Value::as_mapping) else {
        return;
    };
    for (name, spec) in params {
        let Some(name) = name.as_str() else { continue };
        let param_path = format!("{path}.params.{name}");
        let Some(spec) = spec.as_mapping() else {
            issues.push(ValidationIssue::new(
                &param_path,
                IssueCode::MissingField,
                "parameter spec must be a mapping",
            ));
            continue;
        };
        let param_type = get(spec, "type").and_then(Value::as_str);
        match param_type {
            Some(t) if VALID_PARAM_TYPES.contains(&t) => {
                if t == "enum" && get(spec, "values").and_then(Value::as_sequence).is_none() {
                    issues.push(ValidationIssue::new(
                        format!("{param_path}.values"),
                        IssueCode::MissingEnumValues,
                        "enum parameters must declare a non-empty `values` list",
                    ));
                }
                if let Some(default) = get(spec, "default") {
                    if !default_matches_type(default, t) {
                        issues.push(ValidationIssue::new(
                            format!("{param_path}.default"),
                            IssueCode::DefaultTypeMismatch,
                            format!("default value does not match declared type `{t}`"),
                        ));
                    }
                }
            }
            Some(t) => issues.push(ValidationIssue::new(
                format!("{param_path}.type"),
                IssueCode::MissingParamType,
                format!("`{t}` is not a recognized parameter type"),
            )),
            None => issues.push(ValidationIssue::new(
                format!("{param_path}.type"),
                IssueCode::MissingParamType,
                "parameter type is required",
            )),
        }
    }
}

fn default_matches_type(value: &Value, param_type: &str) -> bool {
    match param_type {
        "string" | "enum" => value.is_string(),
        "number" => value.is_number(),
        "boolean" => value.is_bool(),
        "array" => value.is_sequence(),
        "object" => value.is_mapping(),
        _ => true,
    }
}

fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
