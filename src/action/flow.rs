use serde::{Deserialize, Serialize};

use super::Action;

/// An ordered, finite sequence of actions dispatched as one logical chain.
///
/// Concatenation via [`ActionFlow::then`] is associative and the empty flow
/// is its identity, so flows compose freely before dispatch. An error on any
/// action in a flow aborts the actions that follow it in the same flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionFlow {
    actions: Vec<Action>,
}

impl ActionFlow {
    /// The empty flow; dispatching it is a no-op.
    pub fn new() -> Self {
        Self::default()
    }

    /// A flow containing a single action.
    pub fn single(action: Action) -> Self {
        Self {
            actions: vec![action],
        }
    }

    /// Append another flow after this one.
    pub fn then(mut self, next: ActionFlow) -> Self {
        self.actions.extend(next.actions);
        self
    }

    /// Append a single action after this flow.
    pub fn then_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }
}

impl From<Action> for ActionFlow {
    fn from(action: Action) -> Self {
        Self::single(action)
    }
}

impl From<Vec<Action>> for ActionFlow {
    fn from(actions: Vec<Action>) -> Self {
        Self { actions }
    }
}

impl FromIterator<Action> for ActionFlow {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ActionFlow {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}
