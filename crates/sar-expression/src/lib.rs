//! Sandboxed interpolation and condition mini-language (spec §4.1).
//!
//! Two pure, side-effect-free entry points are exposed:
//!
//! - [`resolve`] — replace every `${expr}` placeholder in a string template
//!   with its evaluated value.
//! - [`evaluate_condition`] — interpolate, then parse and evaluate a boolean
//!   condition expression.
//!
//! Everything downstream (tokenizer, parser, evaluator, path traversal) is
//! fully synchronous and never touches the filesystem or network — the only
//! inputs are the expression text and an [`ExecutionContextSnapshot`].

pub mod ast;
pub mod coerce;
pub mod error;
pub mod eval;
pub mod parser;
pub mod path;
pub mod token;

pub use ast::Expr;
pub use coerce::is_truthy;
pub use error::{ExpressionError, ExpressionErrorKind};

use sar_types::ExecutionContextSnapshot;
use serde_json::Value;

/// Replace every `${expr}` placeholder in `template` with its evaluated
/// value.
///
/// When `template` is *exactly* one placeholder (`${...}` with nothing
/// before or after), the placeholder's original typed [`Value`] is returned
/// unchanged rather than being stringified — this is how a `${params.x}`
/// step argument can carry through a number, bool, array or object instead
/// of always becoming a string. Any other shape (including an empty
/// template, or one with surrounding text) is built by coercing each
/// evaluated placeholder to a string and concatenating.
pub fn resolve(template: &str, ctx: &ExecutionContextSnapshot) -> Result<Value, ExpressionError> {
    let placeholders = scan_placeholders(template)?;
    if placeholders.is_empty() {
        return Ok(Value::String(template.to_string()));
    }
    if placeholders.len() == 1 {
        let p = &placeholders[0];
        if p.start == 0 && p.end == template.len() {
            return resolve_path_expr(&p.body, p.body_offset, ctx);
        }
    }

    let mut out = String::with_capacity(template.len());
    let mut cursor = 0usize;
    for p in &placeholders {
        out.push_str(&template[cursor..p.start]);
        let value = resolve_path_expr(&p.body, p.body_offset, ctx)?;
        out.push_str(&value_to_string(&value));
        cursor = p.end;
    }
    out.push_str(&template[cursor..]);
    Ok(Value::String(out))
}

/// Walk a JSON value recursively, resolving every string leaf through
/// [`resolve`]. Non-string leaves (numbers, bools, null) pass through
/// unchanged; maps and arrays are rebuilt with their children resolved.
pub fn resolve_object(
    value: &Value,
    ctx: &ExecutionContextSnapshot,
) -> Result<Value, ExpressionError> {
    match value {
        Value::String(s) => resolve(s, ctx),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(resolve_object(item, ctx)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), resolve_object(v, ctx)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

/// Interpolate any `${var}` sub-references inside `expr` (producing a pure
/// literal expression), then tokenize, parse and evaluate it to a boolean.
pub fn evaluate_condition(
    expr: &str,
    ctx: &ExecutionContextSnapshot,
) -> Result<bool, ExpressionError> {
    let interpolated = resolve(expr, ctx)?;
    let literal = match &interpolated {
        Value::String(s) => s.clone(),
        other => value_to_string(other),
    };
    let tokens = token::tokenize(&literal)?;
    let tree = parser::parse(&tokens)?;
    Ok(is_truthy(&eval::eval(&tree)))
}

/// Extract every `${...}` placeholder body (and its byte offset) from
/// `template`, without evaluating or resolving any of them. Used by
/// `sar-schema` to statically check variable references at load time.
pub fn extract_placeholder_paths(
    template: &str,
) -> Result<Vec<(String, usize)>, ExpressionError> {
    Ok(scan_placeholders(template)?
        .into_iter()
        .map(|p| (p.body, p.body_offset))
        .collect())
}

/// Byte spans of every `${...}` placeholder in `template`, in order.
pub fn placeholder_spans(template: &str) -> Result<Vec<(usize, usize)>, ExpressionError> {
    Ok(scan_placeholders(template)?
        .into_iter()
        .map(|p| (p.start, p.end))
        .collect())
}

/// One `${...}` placeholder found in a template, with byte offsets into the
/// original text (`start`/`end` span the whole `${...}`, `body_offset`
/// points just past the opening `${`).
struct Placeholder {
    start: usize,
    end: usize,
    body: String,
    body_offset: usize,
}

/// Scan `template` for `${...}` placeholders, respecting nested braces and
/// string literals inside the placeholder body so a `${...}` containing a
/// quoted `}` doesn't terminate early.
fn scan_placeholders(template: &str) -> Result<Vec<Placeholder>, ExpressionError> {
    let bytes = template.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            let body_start = i + 2;
            let mut depth = 1u32;
            let mut j = body_start;
            let mut in_string = false;
            while j < bytes.len() && depth > 0 {
                match bytes[j] {
                    b'"' if !in_string => in_string = true,
                    b'"' if in_string => in_string = false,
                    b'\\' if in_string => j += 1,
                    b'{' if !in_string => depth += 1,
                    b'}' if !in_string => depth -= 1,
                    _ => {}
                }
                j += 1;
            }
            if depth != 0 {
                return Err(ExpressionError::new(
                    ExpressionErrorKind::UnterminatedPlaceholder,
                    i,
                ));
            }
            let body_end = j - 1;
            out.push(Placeholder {
                start: i,
                end: j,
                body: template[body_start..body_end].to_string(),
                body_offset: body_start,
            });
            i = j;
        } else {
            i += 1;
        }
    }
    Ok(out)
}

/// Resolve the body of one placeholder: either a bare variable path
/// (`params.username`) or, per spec §4.1, a path is the only shape a
/// placeholder body takes inside `${...}` — comparisons and booleans only
/// appear in `when`/`verify` expressions, never inside interpolation.
fn resolve_path_expr(
    body: &str,
    offset: usize,
    ctx: &ExecutionContextSnapshot,
) -> Result<Value, ExpressionError> {
    let path = path::parse_path(body, offset)?;
    let segments: Vec<&str> = path.segments.iter().map(String::as_str).collect();
    Ok(ctx.get_path(&path.root, &segments).unwrap_or(Value::Null))
}

/// Coerce an evaluated placeholder value to the string it contributes to a
/// multi-placeholder (or mixed-text) template.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}
