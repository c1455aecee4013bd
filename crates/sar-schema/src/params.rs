//! Runtime parameter validation (spec §4.2, `PARAM_REQUIRED`/`PARAM_INVALID`):
//! checking a caller-supplied `params` object against an action's declared
//! [`ParameterSpec`] table before execution starts.
//!
//! This is distinct from the load-time structural/semantic passes in
//! [`crate::structural`] and [`crate::semantic`] — those check the action
//! *definition*; this checks one *invocation* of it.

use indexmap::IndexMap;
use sar_error::ActionError;
use sar_types::{ParamType, ParameterSpec};
use serde_json::Value;
use tracing::warn;

/// Validate and fill in defaults for `input` against `params`, returning the
/// effective parameter object the executor builds its context from.
///
/// - A missing required parameter with no `default` is `PARAM_REQUIRED`.
/// - A present value that doesn't match its declared type, after the
///   lenient string/number/boolean coercions described below, is
///   `PARAM_INVALID`.
/// - An `enum` parameter's value must be one of `values`, also
///   `PARAM_INVALID` otherwise.
/// - Keys in `input` not present in `params` are dropped with a warning
///   rather than rejected, so callers can pass a superset (e.g. forwarding
///   an upstream request body) without the action definition tracking every
///   possible extra field.
pub fn validate_params(
    action_name: &str,
    params: &IndexMap<String, ParameterSpec>,
    input: &Value,
) -> Result<Value, ActionError> {
    let input_map = input.as_object();

    for key in input_map.into_iter().flat_map(serde_json::Map::keys) {
        if !params.contains_key(key) {
            warn!(action = action_name, param = key, "ignoring undeclared parameter");
        }
    }

    let mut effective = serde_json::Map::with_capacity(params.len());
    for (name, spec) in params {
        let provided = input_map.and_then(|m| m.get(name));
        let value = match provided {
            Some(v) if !v.is_null() => coerce(v, spec.param_type),
            _ => spec.default.clone(),
        };

        let Some(value) = value else {
            if spec.required {
                return Err(ActionError::param_required(action_name, name));
            }
            continue;
        };

        if !spec.param_type.matches(&value) {
            return Err(ActionError::param_invalid(
                action_name,
                name,
                format!("expected {:?}, got {value}", spec.param_type),
            ));
        }

        if spec.param_type == ParamType::Enum {
            let allowed = spec.values.as_deref().unwrap_or_default();
            let as_str = value.as_str().unwrap_or_default();
            if !allowed.iter().any(|v| v == as_str) {
                return Err(ActionError::param_invalid(
                    action_name,
                    name,
                    format!("`{as_str}` is not one of {allowed:?}"),
                ));
            }
        }

        effective.insert(name.clone(), value);
    }

    Ok(Value::Object(effective))
}

/// Apply the lenient coercions spec §4.2 allows at the parameter boundary:
/// a numeric string becomes a number, `"true"`/`"false"` become a boolean.
/// Anything that doesn't cleanly coerce is passed through unchanged so the
/// subsequent type check reports it as `PARAM_INVALID`.
fn coerce(value: &Value, expected: ParamType) -> Option<Value> {
    match (expected, value) {
        (ParamType::Number, Value::String(s)) => s
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .or_else(|| Some(value.clone())),
        (ParamType::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => Some(value.clone()),
        },
        _ => Some(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params() -> IndexMap<String, ParameterSpec> {
        let mut m = IndexMap::new();
        m.insert(
            "username".to_string(),
            ParameterSpec {
                param_type: ParamType::String,
                required: true,
                default: None,
                values: None,
                secret: false,
                description: None,
            },
        );
        m.insert(
            "retries".to_string(),
            ParameterSpec {
                param_type: ParamType::Number,
                required: false,
                default: Some(json!(3)),
                values: None,
                secret: false,
                description: None,
            },
        );
        m.insert(
            "mode".to_string(),
            ParameterSpec {
                param_type: ParamType::Enum,
                required: true,
                default: None,
                values: Some(vec!["fast".to_string(), "safe".to_string()]),
                secret: false,
                description: None,
            },
        );
        m
    }

    #[test]
    fn fills_default_for_missing_optional_param() {
        let out = validate_params(
            "a",
            &params(),
            &json!({ "username": "alice", "mode": "fast" }),
        )
        .unwrap();
        assert_eq!(out["retries"], json!(3));
    }

    #[test]
    fn rejects_missing_required_param() {
        let err = validate_params("a", &params(), &json!({ "mode": "fast" })).unwrap_err();
        assert!(matches!(err, ActionError::ParamRequired { .. }));
    }

    #[test]
    fn rejects_enum_value_not_in_list() {
        let err = validate_params(
            "a",
            &params(),
            &json!({ "username": "alice", "mode": "turbo" }),
        )
        .unwrap_err();
        assert!(matches!(err, ActionError::ParamInvalid { .. }));
    }

    #[test]
    fn coerces_numeric_string_for_number_param() {
        let out = validate_params(
            "a",
            &params(),
            &json!({ "username": "alice", "mode": "fast", "retries": "5" }),
        )
        .unwrap();
        assert_eq!(out["retries"], json!(5.0));
    }

    #[test]
    fn drops_undeclared_keys_without_error() {
        let out = validate_params(
            "a",
            &params(),
            &json!({ "username": "alice", "mode": "fast", "extra": true }),
        )
        .unwrap();
        assert!(out.get("extra").is_none());
    }
}
