use tracing::debug;
use uuid::Uuid;

use super::errors::{StateMachineError, StateMachineResult};
use super::events::TraversalEvent;
use super::states::TraversalState;

/// Tracks one admission of an action through the pipeline.
///
/// A redirect retires the current traversal; the redirect target begins a
/// fresh traversal with its own identity.
#[derive(Debug, Clone)]
pub struct Traversal {
    traversal_uuid: Uuid,
    action_name: String,
    state: TraversalState,
}

impl Traversal {
    /// Begin a new traversal for the named action
    pub fn begin(action_name: impl Into<String>) -> Self {
        Self {
            traversal_uuid: Uuid::new_v4(),
            action_name: action_name.into(),
            state: TraversalState::default(),
        }
    }

    pub fn traversal_uuid(&self) -> Uuid {
        self.traversal_uuid
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    /// Attempt to advance the traversal state
    pub fn advance(&mut self, event: TraversalEvent) -> StateMachineResult<TraversalState> {
        let target = Self::determine_target_state(self.state, event)?;

        debug!(
            traversal_uuid = %self.traversal_uuid,
            action = %self.action_name,
            from = %self.state,
            to = %target,
            event = event.as_str(),
            "Traversal state transition"
        );

        self.state = target;
        Ok(target)
    }

    /// Determine the target state for a state/event pair
    pub fn determine_target_state(
        current_state: TraversalState,
        event: TraversalEvent,
    ) -> StateMachineResult<TraversalState> {
        let target = match (current_state, event) {
            (TraversalState::Pending, TraversalEvent::Admit) => TraversalState::Executing,
            (TraversalState::Pending, TraversalEvent::Park) => TraversalState::Waiting,
            // A pre hook error fails the traversal before handlers run
            (TraversalState::Pending, TraversalEvent::Fail) => TraversalState::Failed,
            (TraversalState::Executing, TraversalEvent::Succeed) => TraversalState::Completed,
            (TraversalState::Executing, TraversalEvent::Fail) => TraversalState::Failed,
            (from_state, event) => {
                return Err(StateMachineError::InvalidTransition {
                    from: from_state.to_string(),
                    event: event.as_str().to_string(),
                })
            }
        };

        Ok(target)
    }
}
