use serde::{Deserialize, Serialize};

/// One structural or semantic problem found in a source file, shaped to
/// serialize directly as one entry of `action.validate`'s
/// `errors?: [{path, code, message}]` result (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path into the document where the problem was found, e.g.
    /// `actions.simple_login.steps[2].args.selector`.
    pub path: String,
    pub code: IssueCode,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
        }
    }
}

/// A finer-grained classification than [`sar_error::ErrorCode`] — every
/// variant here maps to `VALIDATION_ERROR` once it crosses into an
/// [`sar_error::ActionError`], but keeping it distinct lets tooling (and
/// tests) assert on *which* rule tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    MissingField,
    InvalidSchemaVersion,
    InvalidIdentifier,
    InvalidSemver,
    EmptyDescription,
    EmptySteps,
    MissingParamType,
    MissingEnumValues,
    DefaultTypeMismatch,
    UnknownStepAction,
    UnknownVariableRoot,
    ForbiddenPathSegment,
    UnknownParamReference,
    UnknownSelectorReference,
    UnknownStepReference,
    ExpressionSyntax,
    FallbackCycle,
    DanglingAliasOf,
    AliasOfDeprecatedTarget,
}

/// Aggregate validation failure: one or more [`ValidationIssue`]s. Never
/// constructed for a single-issue short-circuit — callers collect every
/// issue the structural and semantic passes find before returning.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{} validation issue(s)", .0.len())]
pub struct ValidationError(pub Vec<ValidationIssue>);

impl ValidationError {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }
}

impl From<ValidationError> for sar_error::ActionError {
    fn from(err: ValidationError) -> Self {
        let message = err
            .0
            .first()
            .map(|i| format!("{}: {}", i.path, i.message))
            .unwrap_or_else(|| "validation failed".to_string());
        sar_error::ActionError::validation(message, err.0.first().map(|i| i.path.clone()))
    }
}
