//! Error types for the relay engine.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RelayError {
    #[error("Dispatch error: {0}")]
    DispatchError(String),
    #[error("Registry error: {0}")]
    RegistryError(String),
    #[error("Event error: {0}")]
    EventError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("State machine error: {0}")]
    StateMachineError(String),
}

impl From<serde_json::Error> for RelayError {
    fn from(error: serde_json::Error) -> Self {
        RelayError::ValidationError(format!("JSON serialization error: {error}"))
    }
}

impl From<crate::dispatch::DispatchError> for RelayError {
    fn from(error: crate::dispatch::DispatchError) -> Self {
        RelayError::DispatchError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
