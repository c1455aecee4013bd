use thiserror::Error;

/// Errors owned by the version manager (spec §4.4), distinct from the
/// general `ACTION_NOT_FOUND`/`STEP_FAILED` family.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("detected version `{detected}` is outside the declared range {range}")]
    Incompatible { detected: String, range: String },

    #[error("`{0}` is not a valid version string")]
    InvalidVersion(String),

    #[error("`{0}` is not a valid version range")]
    InvalidRange(String),
}

impl From<VersionError> for sar_error::ActionError {
    fn from(err: VersionError) -> Self {
        match err {
            VersionError::Incompatible { detected, range } => {
                sar_error::ActionError::version_incompatible(detected, range)
            }
            VersionError::InvalidVersion(v) => {
                sar_error::ActionError::validation(format!("invalid version `{v}`"), None)
            }
            VersionError::InvalidRange(r) => {
                sar_error::ActionError::validation(format!("invalid version range `{r}`"), None)
            }
        }
    }
}
