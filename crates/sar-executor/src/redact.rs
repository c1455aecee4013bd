//! Secret redaction (spec §4.6 "tracing and redaction"): any argument
//! sourced from a parameter marked `secret: true` is replaced by `***`
//! before it ever reaches a trace entry or an error message.

use std::collections::HashSet;

use serde_json::Value;

/// Walk `raw` (the pre-interpolation template tree) alongside `resolved`
/// (its interpolated counterpart), replacing any leaf whose raw template
/// references `params.<name>` for a `name` in `secret_params` with `"***"`.
///
/// Matching against the *raw* template rather than the resolved value is
/// deliberate: a secret value could coincidentally look like plain text
/// after interpolation, but the template that produced it is always
/// syntactically traceable back to the parameter it read.
pub fn redact_args(raw: &Value, resolved: &Value, secret_params: &HashSet<String>) -> Value {
    if secret_params.is_empty() {
        return resolved.clone();
    }
    match (raw, resolved) {
        (Value::String(s), _) => {
            if references_secret(s, secret_params) {
                Value::String("***".to_string())
            } else {
                resolved.clone()
            }
        }
        (Value::Array(raw_items), Value::Array(res_items)) if raw_items.len() == res_items.len() => {
            Value::Array(
                raw_items
                    .iter()
                    .zip(res_items)
                    .map(|(r, v)| redact_args(r, v, secret_params))
                    .collect(),
            )
        }
        (Value::Object(raw_map), Value::Object(res_map)) => {
            let mut out = serde_json::Map::with_capacity(raw_map.len());
            for (k, rv) in raw_map {
                let resolved_v = res_map.get(k).cloned().unwrap_or(Value::Null);
                out.insert(k.clone(), redact_args(rv, &resolved_v, secret_params));
            }
            Value::Object(out)
        }
        _ => resolved.clone(),
    }
}

/// Whether `template` reads any of `secret_params` under the `params` root.
pub fn references_secret(template: &str, secret_params: &HashSet<String>) -> bool {
    secret_params
        .iter()
        .any(|name| template.contains(&format!("params.{name}")))
}
