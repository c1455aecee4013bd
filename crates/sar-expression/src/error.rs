use thiserror::Error;

/// One lexical, syntactic, semantic, or safety violation, carrying the byte
/// offset into the expression (or template) text where it occurred.
#[derive(Debug, Clone, Error)]
#[error("{kind} at byte {offset}")]
pub struct ExpressionError {
    pub kind: ExpressionErrorKind,
    pub offset: usize,
}

impl ExpressionError {
    pub fn new(kind: ExpressionErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExpressionErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated placeholder")]
    UnterminatedPlaceholder,
    #[error("unexpected end of expression")]
    UnexpectedEof,
    #[error("unexpected token, expected {expected}")]
    UnexpectedToken { expected: &'static str },
    #[error("forbidden construct: {0}")]
    Forbidden(String),
    #[error("expression nesting exceeds max depth of {max}")]
    MaxDepthExceeded { max: u32 },
    #[error("unknown variable root scope '{0}'")]
    UnknownRoot(String),
    #[error("path segment '{0}' is forbidden")]
    ForbiddenSegment(String),
    #[error("empty path expression")]
    EmptyPath,
}

impl From<ExpressionError> for sar_error::ActionError {
    fn from(err: ExpressionError) -> Self {
        sar_error::ActionError::expression(err.kind.to_string(), err.offset)
    }
}
