use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named, immutable unit of work submitted to the dispatch engine.
///
/// The name identifies the action for routing, deferral prerequisites, and
/// history lookups; the payload is opaque to the engine and is handed to
/// handlers untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    name: String,
    #[serde(default)]
    payload: Value,
}

impl Action {
    /// Create an action with no payload.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Value::Null,
        }
    }

    /// Create an action carrying an opaque payload.
    pub fn with_payload(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

impl Eq for Action {}

// Hash by name only; payload participates in equality but not hashing so
// that a name-keyed lookup finds every payload variant of the same action.
impl Hash for Action {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
