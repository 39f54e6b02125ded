//! # History Log
//!
//! Append-only record of every action that completed its full traversal of
//! the pipeline, in completion order. Reads are public; appends and clears
//! belong to the coordinator, so middleware and callers only ever see a
//! read-only surface.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::action::Action;

/// One completed traversal as recorded in history
#[derive(Debug, Clone)]
pub struct CompletedAction {
    pub action: Action,
    pub traversal_uuid: Uuid,
    pub completed_at: DateTime<Utc>,
}

/// Ordered, append-only log of completed actions
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: RwLock<Vec<CompletedAction>>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of completed actions in completion order
    pub fn snapshot(&self) -> Vec<Action> {
        self.entries
            .read()
            .iter()
            .map(|entry| entry.action.clone())
            .collect()
    }

    /// Snapshot of full history entries including completion metadata
    pub fn entries(&self) -> Vec<CompletedAction> {
        self.entries.read().clone()
    }

    /// Whether any action with the given name has completed
    pub fn contains(&self, action_name: &str) -> bool {
        self.entries
            .read()
            .iter()
            .any(|entry| entry.action.name() == action_name)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Record a completed traversal. Called exactly once per action that
    /// passed all middleware and handlers.
    pub(crate) fn append(&self, action: Action, traversal_uuid: Uuid) {
        self.entries.write().push(CompletedAction {
            action,
            traversal_uuid,
            completed_at: Utc::now(),
        });
    }

    pub(crate) fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let history = HistoryLog::new();
        history.append(Action::named("first"), Uuid::new_v4());
        history.append(Action::named("second"), Uuid::new_v4());

        let names: Vec<String> = history
            .snapshot()
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_contains_by_name() {
        let history = HistoryLog::new();
        assert!(!history.contains("login"));

        history.append(Action::named("login"), Uuid::new_v4());
        assert!(history.contains("login"));
        assert!(!history.contains("logout"));
    }

    #[test]
    fn test_clear_empties_the_log() {
        let history = HistoryLog::new();
        history.append(Action::named("login"), Uuid::new_v4());
        history.clear();
        assert!(history.is_empty());
        assert!(!history.contains("login"));
    }
}
