use serde::{Deserialize, Serialize};
use std::fmt;

/// Traversal state definitions for one admission of an action into the
/// pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalState {
    /// Initial state before the middleware pre stage has decided anything
    Pending,
    /// Handlers are running for the action
    Executing,
    /// The action is parked in a deferral queue; this traversal is over and
    /// re-admission starts a fresh one
    Waiting,
    /// The action passed all middleware and handlers and entered history
    Completed,
    /// The action was rejected by a pre hook or a handler failed the chain
    Failed,
}

impl TraversalState {
    /// Check if this traversal has finished with a definite outcome
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if the action is parked awaiting a prerequisite
    pub fn is_parked(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Check if handlers are currently running
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Executing)
    }
}

impl fmt::Display for TraversalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Executing => write!(f, "executing"),
            Self::Waiting => write!(f, "waiting"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TraversalState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "executing" => Ok(Self::Executing),
            "waiting" => Ok(Self::Waiting),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid traversal state: {s}")),
        }
    }
}

impl Default for TraversalState {
    fn default() -> Self {
        Self::Pending
    }
}
