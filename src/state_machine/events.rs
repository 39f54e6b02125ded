use serde::{Deserialize, Serialize};

/// Events that drive a traversal through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalEvent {
    /// The pre stage continued (or a look-behind deferral was satisfied by
    /// history) and handlers may run
    Admit,
    /// The pre stage parked the action in a deferral queue
    Park,
    /// All handlers finished without failing the chain
    Succeed,
    /// A pre hook raised or a handler failed the chain
    Fail,
}

impl TraversalEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admit => "admit",
            Self::Park => "park",
            Self::Succeed => "succeed",
            Self::Fail => "fail",
        }
    }
}
