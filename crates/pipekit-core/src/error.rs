//! Toolkit-level error returned by component actions.

/// Why a component action failed. Callers use the variant to decide whether
/// the pipeline run as a whole should fail.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// A required input (token, repository, ...) was not provided.
    #[error("missing required option `{0}`")]
    MissingOption(&'static str),
    /// A failure that retrying would not fix.
    #[error("{0}")]
    Fatal(String),
    /// Retry limits ran out before the action could complete.
    #[error("{0}")]
    LimitExceeded(String),
}

impl ActionError {
    pub fn fatal(message: impl Into<String>) -> Self {
        ActionError::Fatal(message.into())
    }
}

