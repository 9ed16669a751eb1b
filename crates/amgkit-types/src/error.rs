//! Error types for amgkit.
//!
//! All crates return `AmgResult<T>` from fallible operations.

use thiserror::Error;

use crate::state::Phase;

/// Unified error type for amgkit.
#[derive(Debug, Error)]
pub enum AmgError {
    /// An operation was invoked on a handle that is not live.
    #[error("cannot {operation} {object}: handle is {phase}")]
    InvalidState {
        /// Handle kind (e.g. "parameter store").
        object: &'static str,
        /// Attempted operation.
        operation: &'static str,
        /// Lifecycle phase the handle was in.
        phase: Phase,
    },

    /// The engine rejected the matrix or the parameters during build.
    #[error("engine construction failed: {0}")]
    EngineConstruction(String),

    /// A vector or matrix does not match the bound dimension.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which argument mismatched.
        what: &'static str,
        /// Bound dimension.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// CSR arrays are structurally inconsistent.
    #[error("invalid matrix: {0}")]
    InvalidMatrix(String),

    /// A recognized parameter has an unusable value.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Dotted parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parameter document could not be parsed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AmgError {
    /// Shorthand for an [`AmgError::InvalidParameter`].
    pub fn parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Folds any build-time failure into [`AmgError::EngineConstruction`],
    /// keeping the original message. Lifecycle errors pass through.
    pub fn into_construction(self) -> Self {
        match self {
            Self::EngineConstruction(_) | Self::InvalidState { .. } => self,
            other => Self::EngineConstruction(other.to_string()),
        }
    }

    /// Returns true for errors that signal a caller usage bug.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidState { .. } | Self::DimensionMismatch { .. }
        )
    }
}

/// Convenience alias for `Result<T, AmgError>`.
pub type AmgResult<T> = Result<T, AmgError>;
