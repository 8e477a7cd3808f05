use thiserror::Error;

/// Errors raised by the scheduling engine.
///
/// Solver statuses such as infeasibility or an exhausted time budget are not errors:
/// they are reported through [`crate::solver::Status`] and handled by the pipelines.
#[derive(Debug, Error)]
pub enum Error {
    /// The instance is missing a field or carries an invalid value.
    /// Raised before any pipeline stage runs.
    #[error("malformed instance: {0}")]
    MalformedInstance(String),

    /// The optimizer backend failed for a reason other than infeasibility or timeout.
    #[error("optimizer `{backend}` failed: {message}")]
    Optimizer { backend: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInstance(message.into())
    }

    pub(crate) fn optimizer(backend: &str, message: impl std::fmt::Display) -> Self {
        Self::Optimizer {
            backend: backend.into(),
            message: message.to_string(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
