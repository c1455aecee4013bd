use serde_json::Value;

/// Truthiness per spec §4.1: empty string, 0, false, null are falsy; all
/// else (including non-empty arrays/objects) is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Lenient numeric coercion used by ordered comparisons: non-numeric
/// coerces to `0.0`.
pub fn to_number_or_zero(value: &Value) -> f64 {
    to_number_lenient(value).unwrap_or(0.0)
}

/// Attempt numeric coercion without a default, used by loose equality.
pub fn to_number_lenient(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Loose `==` per spec: numbers compare numerically; two strings try a
/// numeric parse of both sides first, falling back to literal string
/// comparison when either side isn't parsable; mixed number/string/bool
/// pairs coerce the non-numeric side to a number.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(_), Value::Number(_)) => {
            to_number_lenient(a) == to_number_lenient(b)
        }
        (Value::String(x), Value::String(y)) => {
            match (x.trim().parse::<f64>(), y.trim().parse::<f64>()) {
                (Ok(nx), Ok(ny)) => nx == ny,
                _ => x == y,
            }
        }
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => a == b,
        _ => match (to_number_lenient(a), to_number_lenient(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn truthy_rules_match_spec() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&Value::Bool(false)));
        assert!(!is_truthy(&Value::from(0)));
        assert!(!is_truthy(&Value::from("")));
        assert!(is_truthy(&Value::from("0 ")));
        assert!(is_truthy(&Value::Bool(true)));
        assert!(is_truthy(&Value::from(1)));
    }

    #[test]
    fn numeric_strings_compare_numerically() {
        assert!(loose_eq(&Value::from("5"), &Value::from(5)));
        assert!(loose_eq(&Value::from("5.0"), &Value::from("5")));
    }

    #[test]
    fn non_numeric_strings_compare_literally() {
        assert!(loose_eq(&Value::from("abc"), &Value::from("abc")));
        assert!(!loose_eq(&Value::from("abc"), &Value::from("def")));
    }

    #[test]
    fn non_numeric_coerces_to_zero_for_ordering() {
        assert_eq!(to_number_or_zero(&Value::from("not-a-number")), 0.0);
        assert_eq!(to_number_or_zero(&Value::Null), 0.0);
    }

    #[test]
    fn bool_and_number_mixed_equality_coerces() {
        assert!(loose_eq(&Value::Bool(true), &Value::from(1)));
        assert!(!loose_eq(&Value::Bool(true), &Value::from(2)));
    }
}
