use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::Action;

/// A set of action names used purely for membership tests.
///
/// Groups scope handler registrations to the actions they care about and
/// back middleware policies of the form "does this action belong to the
/// admin surface". Union is commutative and associative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGroup {
    names: HashSet<String>,
}

impl ActionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a group from a list of action names.
    pub fn of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Set union with another group.
    pub fn union(mut self, other: ActionGroup) -> Self {
        self.names.extend(other.names);
        self
    }

    pub fn contains(&self, action: &Action) -> bool {
        self.names.contains(action.name())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

impl<S: Into<String>> FromIterator<S> for ActionGroup {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::of(iter)
    }
}
