use thiserror::Error;

/// Errors owned by the loader and registry (spec §4.3), distinct from the
/// per-file [`sar_schema::ValidationError`] a single source file can fail
/// with (that one is logged and the file dropped; it never reaches here).
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extends cycle detected: {}", .0.join(" -> "))]
    ExtendsCycle(Vec<String>),

    #[error("namespace `{namespace}` extends unknown namespace `{parent}`")]
    UnknownParent { namespace: String, parent: String },

    #[error("no namespace named `{0}`")]
    NamespaceNotFound(String),
}

impl From<RegistryError> for sar_error::ActionError {
    fn from(err: RegistryError) -> Self {
        sar_error::ActionError::validation(err.to_string(), None)
    }
}
