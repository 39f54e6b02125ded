//! Error types for the dispatch pipeline.

use thiserror::Error;

use crate::state_machine::StateMachineError;

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Specific dispatch error types for detailed error handling
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// A pre middleware hook rejected the action outright; no handler ran
    #[error("Action {action} rejected by {middleware}: {reason}")]
    Gated {
        action: String,
        middleware: String,
        reason: String,
    },

    /// A handler failed while performing the action's work
    #[error("Handler {handler} failed for action {action}: {reason}")]
    HandlerFailed {
        action: String,
        handler: String,
        reason: String,
    },

    /// A handler exceeded the configured invocation timeout
    #[error("Handler {handler} timed out after {timeout_ms}ms for action {action}")]
    HandlerTimeout {
        action: String,
        handler: String,
        timeout_ms: u64,
    },

    /// A spawned handler task panicked
    #[error("Handler task panicked for action {action}: {reason}")]
    HandlerPanicked { action: String, reason: String },

    /// A newer dispatch of the same action identity cancelled this one
    #[error("Dispatch of action {action} was superseded by a newer dispatch")]
    Superseded { action: String },

    /// Internal engine invariant violation
    #[error("Internal dispatch error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Gating rejection raised from a middleware `pre` hook
    pub fn gated(
        action: impl Into<String>,
        middleware: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Gated {
            action: action.into(),
            middleware: middleware.into(),
            reason: reason.into(),
        }
    }
}

impl From<StateMachineError> for DispatchError {
    fn from(error: StateMachineError) -> Self {
        DispatchError::Internal(error.to_string())
    }
}
