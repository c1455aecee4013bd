use serde_json::Value;

use crate::ast::Expr;
use crate::coerce::{is_truthy, loose_eq, to_number_or_zero};

/// Evaluate a parsed condition tree to its final [`Value`]. Pure and total
/// over any tree the parser can produce — no error path is needed here
/// because every safety/type violation was already rejected at tokenize or
/// parse time.
pub fn eval(expr: &Expr) -> Value {
    match expr {
        Expr::Literal(v) => v.clone(),
        Expr::Not(inner) => Value::Bool(!is_truthy(&eval(inner))),
        Expr::And(l, r) => {
            let left = eval(l);
            if !is_truthy(&left) {
                Value::Bool(false)
            } else {
                Value::Bool(is_truthy(&eval(r)))
            }
        }
        Expr::Or(l, r) => {
            let left = eval(l);
            if is_truthy(&left) {
                Value::Bool(true)
            } else {
                Value::Bool(is_truthy(&eval(r)))
            }
        }
        Expr::Eq(l, r) => Value::Bool(loose_eq(&eval(l), &eval(r))),
        Expr::Ne(l, r) => Value::Bool(!loose_eq(&eval(l), &eval(r))),
        Expr::Gt(l, r) => Value::Bool(to_number_or_zero(&eval(l)) > to_number_or_zero(&eval(r))),
        Expr::Lt(l, r) => Value::Bool(to_number_or_zero(&eval(l)) < to_number_or_zero(&eval(r))),
        Expr::Ge(l, r) => Value::Bool(to_number_or_zero(&eval(l)) >= to_number_or_zero(&eval(r))),
        Expr::Le(l, r) => Value::Bool(to_number_or_zero(&eval(l)) <= to_number_or_zero(&eval(r))),
    }
}
