use serde_json::Value;

/// A fully parsed condition expression. Every leaf is a [`Value`] literal —
/// by the time this tree exists, all `${...}` sub-references have already
/// been interpolated away by the caller (see [`crate::evaluate_condition`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Not(Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Ge(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),
}
