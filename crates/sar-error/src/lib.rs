//! Unified error type for the semantic action registry.
//!
//! Every subsystem (expression engine, validator, registry, version manager,
//! executor) owns a narrower error type of its own and converts into
//! [`ActionError`] via `From`, so `?` composes across crate boundaries all
//! the way up to the executor — the only place an [`ActionError`] is turned
//! into the public [`ErrorRecord`] JSON shape.

use serde::{Deserialize, Serialize};

/// The fixed error-code enum surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ActionNotFound,
    ParamRequired,
    ParamInvalid,
    ElementNotFound,
    Timeout,
    StepFailed,
    VersionIncompatible,
    VerifyFailed,
    MaxDepthExceeded,
    ExpressionError,
    ValidationError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ActionNotFound => "ACTION_NOT_FOUND",
            Self::ParamRequired => "PARAM_REQUIRED",
            Self::ParamInvalid => "PARAM_INVALID",
            Self::ElementNotFound => "ELEMENT_NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::StepFailed => "STEP_FAILED",
            Self::VersionIncompatible => "VERSION_INCOMPATIBLE",
            Self::VerifyFailed => "VERIFY_FAILED",
            Self::MaxDepthExceeded => "MAX_DEPTH_EXCEEDED",
            Self::ExpressionError => "EXPRESSION_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
        };
        f.write_str(s)
    }
}

/// The `{code, message, action?, step?, stepAction?, sourcePath?, details?, suggestion?}`
/// record handed back to the caller on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// The single error type that crosses the executor boundary.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ActionError {
    #[error("action not found: {name}")]
    ActionNotFound { name: String },

    #[error("missing required parameter `{param}` for action `{action}`")]
    ParamRequired { action: String, param: String },

    #[error("invalid parameter `{param}` for action `{action}`: {reason}")]
    ParamInvalid {
        action: String,
        param: String,
        reason: String,
    },

    #[error("element not found: {selector}")]
    ElementNotFound {
        selector: String,
        step: Option<usize>,
    },

    #[error("timed out after {elapsed_ms}ms")]
    Timeout {
        elapsed_ms: u64,
        step: Option<usize>,
    },

    #[error("step failed: {message}")]
    StepFailed {
        message: String,
        step: Option<usize>,
        step_action: Option<String>,
        cause: Option<Box<ActionError>>,
    },

    #[error("detected version {detected} incompatible with range {range}")]
    VersionIncompatible { detected: String, range: String },

    #[error("verify failed: {message}")]
    VerifyFailed { message: String },

    #[error("recursion depth exceeded max of {max_depth}")]
    MaxDepthExceeded { max_depth: u32 },

    #[error("expression error at byte {offset}: {message}")]
    Expression { message: String, offset: usize },

    #[error("validation error: {message}")]
    Validation {
        message: String,
        path: Option<String>,
    },
}

impl ActionError {
    pub fn action_not_found(name: impl Into<String>) -> Self {
        Self::ActionNotFound { name: name.into() }
    }

    pub fn param_required(action: impl Into<String>, param: impl Into<String>) -> Self {
        Self::ParamRequired {
            action: action.into(),
            param: param.into(),
        }
    }

    pub fn param_invalid(
        action: impl Into<String>,
        param: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ParamInvalid {
            action: action.into(),
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub fn element_not_found(selector: impl Into<String>, step: Option<usize>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
            step,
        }
    }

    pub fn timeout(elapsed_ms: u64, step: Option<usize>) -> Self {
        Self::Timeout { elapsed_ms, step }
    }

    pub fn step_failed(message: impl Into<String>, step: Option<usize>) -> Self {
        Self::StepFailed {
            message: message.into(),
            step,
            step_action: None,
            cause: None,
        }
    }

    pub fn step_failed_with_cause(
        message: impl Into<String>,
        step: Option<usize>,
        step_action: impl Into<String>,
        cause: ActionError,
    ) -> Self {
        Self::StepFailed {
            message: message.into(),
            step,
            step_action: Some(step_action.into()),
            cause: Some(Box::new(cause)),
        }
    }

    pub fn version_incompatible(detected: impl Into<String>, range: impl Into<String>) -> Self {
        Self::VersionIncompatible {
            detected: detected.into(),
            range: range.into(),
        }
    }

    pub fn verify_failed(message: impl Into<String>) -> Self {
        Self::VerifyFailed {
            message: message.into(),
        }
    }

    pub fn max_depth_exceeded(max_depth: u32) -> Self {
        Self::MaxDepthExceeded { max_depth }
    }

    pub fn expression(message: impl Into<String>, offset: usize) -> Self {
        Self::Expression {
            message: message.into(),
            offset,
        }
    }

    pub fn validation(message: impl Into<String>, path: Option<String>) -> Self {
        Self::Validation {
            message: message.into(),
            path,
        }
    }

    /// The fixed code this error maps to.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ActionNotFound { .. } => ErrorCode::ActionNotFound,
            Self::ParamRequired { .. } => ErrorCode::ParamRequired,
            Self::ParamInvalid { .. } => ErrorCode::ParamInvalid,
            Self::ElementNotFound { .. } => ErrorCode::ElementNotFound,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::StepFailed { .. } => ErrorCode::StepFailed,
            Self::VersionIncompatible { .. } => ErrorCode::VersionIncompatible,
            Self::VerifyFailed { .. } => ErrorCode::VerifyFailed,
            Self::MaxDepthExceeded { .. } => ErrorCode::MaxDepthExceeded,
            Self::Expression { .. } => ErrorCode::ExpressionError,
            Self::Validation { .. } => ErrorCode::ValidationError,
        }
    }

    /// Whether retrying the *whole action* from outside is plausible.
    ///
    /// This is independent of the executor's own per-step retry loop, which
    /// has already run its course by the time an error reaches this point.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ElementNotFound { .. } | Self::StepFailed { .. }
        )
    }

    /// Whether this error is structural and retrying would never help.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ActionNotFound { .. }
                | Self::ParamRequired { .. }
                | Self::ParamInvalid { .. }
                | Self::MaxDepthExceeded { .. }
                | Self::Expression { .. }
                | Self::Validation { .. }
        )
    }

    /// Produce the public `{code, message, ...}` record, applying no
    /// redaction of its own — callers that hold secret-marked values must
    /// redact before constructing the error message in the first place.
    pub fn to_record(&self) -> ErrorRecord {
        let (action, step, step_action, details) = match self {
            Self::ActionNotFound { name } => (Some(name.clone()), None, None, None),
            Self::ParamRequired { action, .. } | Self::ParamInvalid { action, .. } => {
                (Some(action.clone()), None, None, None)
            }
            Self::ElementNotFound { step, .. } | Self::Timeout { step, .. } => {
                (None, *step, None, None)
            }
            Self::StepFailed {
                step,
                step_action,
                cause,
                ..
            } => {
                let details = cause
                    .as_ref()
                    .map(|c| serde_json::json!({ "cause": c.to_record() }));
                (None, *step, step_action.clone(), details)
            }
            Self::VersionIncompatible { .. }
            | Self::VerifyFailed { .. }
            | Self::MaxDepthExceeded { .. }
            | Self::Expression { .. }
            | Self::Validation { .. } => (None, None, None, None),
        };
        ErrorRecord {
            code: self.code(),
            message: self.to_string(),
            action,
            step,
            step_action,
            source_path: None,
            details,
            suggestion: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn action_not_found_round_trips_code() {
        let err = ActionError::action_not_found("test:missing");
        assert_eq!(err.code(), ErrorCode::ActionNotFound);
        assert!(err.is_terminal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn timeout_is_retryable_not_terminal() {
        let err = ActionError::timeout(31_000, Some(2));
        assert!(err.is_retryable());
        assert!(!err.is_terminal());
    }

    #[test]
    fn step_failed_preserves_cause_as_nested_record() {
        let cause = ActionError::element_not_found("#submit", Some(1));
        let err = ActionError::step_failed_with_cause("inner run failed", Some(0), "run", cause);
        let record = err.to_record();
        assert_eq!(record.code, ErrorCode::StepFailed);
        assert_eq!(record.step, Some(0));
        assert_eq!(record.step_action.as_deref(), Some("run"));
        let cause_record = record
            .details
            .as_ref()
            .and_then(|d| d.get("cause"))
            .cloned()
            .expect("cause detail present");
        assert_eq!(cause_record["code"], "ELEMENT_NOT_FOUND");
    }

    #[test]
    fn error_code_display_matches_spec_naming() {
        assert_eq!(ErrorCode::ActionNotFound.to_string(), "ACTION_NOT_FOUND");
        assert_eq!(ErrorCode::ExpressionError.to_string(), "EXPRESSION_ERROR");
        assert_eq!(
            ErrorCode::VersionIncompatible.to_string(),
            "VERSION_INCOMPATIBLE"
        );
    }

    #[test]
    fn record_serializes_camel_case_and_skips_absent_fields() {
        let err = ActionError::verify_failed("total must be positive");
        let record = err.to_record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["code"], "VERIFY_FAILED");
        assert!(json.get("action").is_none());
        assert!(json.get("sourcePath").is_none());
    }

    #[test]
    fn max_depth_exceeded_is_terminal() {
        let err = ActionError::max_depth_exceeded(10);
        assert!(err.is_terminal());
        assert!(!err.is_retryable());
    }
}
