//! Error types for expression evaluation

use thiserror::Error;

/// Main error type for the expression engine
///
/// Every evaluation failure surfaces through one of these variants. There is
/// no partial result: a function either produces its full output or returns
/// an error before touching its inputs.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing, empty or malformed parameters, wrong input shape
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A raw sample value is neither an integer nor a float
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Internal consistency check failed
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Shorthand for [`Error::TypeMismatch`]
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Error::TypeMismatch(message.into())
    }

    /// Shorthand for [`Error::InvariantViolation`]
    pub fn invariant(message: impl Into<String>) -> Self {
        Error::InvariantViolation(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
