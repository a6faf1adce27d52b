//! Unified error type for Persona
//!
//! A single flat error enum shared by every layer. Time-specific failures have
//! their own [`TimeError`](crate::effects::TimeError) and convert into this one.

use crate::effects::TimeError;
use serde::{Deserialize, Serialize};

/// Unified error type for all Persona operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum PersonaError {
    /// Invalid input
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl PersonaError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Standard Result type for Persona operations
pub type Result<T> = std::result::Result<T, PersonaError>;

impl From<std::io::Error> for PersonaError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<TimeError> for PersonaError {
    fn from(err: TimeError) -> Self {
        match err {
            TimeError::TimeoutNotFound { .. } => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err: PersonaError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml").into();
        assert!(matches!(err, PersonaError::NotFound { .. }));
    }

    #[test]
    fn time_errors_keep_their_message() {
        let err: PersonaError = TimeError::ServiceUnavailable.into();
        assert_eq!(
            err,
            PersonaError::internal("Time service unavailable".to_string())
        );
    }
}
