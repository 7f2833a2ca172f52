//! Error kinds surfaced by the classification pipeline.

use std::fmt;

use thiserror::Error;

/// The collapsed error kind, as seen by callers that do not care where a
/// classification failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ClassificationFailed,
}

/// Where a classification failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrigin {
    /// Transport, authentication, or service-side failure of the remote call.
    Remote,
    /// The remote answer did not have the expected shape.
    Validation,
}

impl fmt::Display for FailureOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureOrigin::Remote => write!(f, "remote call"),
            FailureOrigin::Validation => write!(f, "response validation"),
        }
    }
}

/// Error type for the classification pipeline.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("{message}")]
    InvalidInput { message: String },

    #[error("API call failed ({origin}): {message}")]
    ClassificationFailed { origin: FailureOrigin, message: String },
}

impl ClassifyError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    /// Create a classification failure caused by the remote call.
    pub fn remote(message: impl fmt::Display) -> Self {
        Self::ClassificationFailed {
            origin: FailureOrigin::Remote,
            message: message.to_string(),
        }
    }

    /// Create a classification failure caused by a malformed answer.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ClassificationFailed {
            origin: FailureOrigin::Validation,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::ClassificationFailed { .. } => ErrorKind::ClassificationFailed,
        }
    }
}

pub type ClassifyRes<T> = Result<T, ClassifyError>;
