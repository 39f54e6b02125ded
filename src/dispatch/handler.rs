//! # Handlers and Handler Trees
//!
//! Handlers are the registered units that perform the actual work for an
//! action. They compose into explicit trees via [`HandlerNode`] builder
//! constructors: each group node picks a fan-out strategy (concurrent or
//! serial) and a failure policy (fail-fast or catch) for its children.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionFlow};
use crate::dispatch::errors::DispatchError;

/// A stateful unit that performs the work for an action.
///
/// Handler-local state is owned exclusively by the handler; the engine only
/// calls in. Returning a flow asks the engine to dispatch it as an
/// independent follow-up chain (fire-and-continue).
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, action: &Action) -> anyhow::Result<Option<ActionFlow>>;

    /// Handler name for identification
    fn handler_name(&self) -> &str {
        "unnamed_handler"
    }
}

/// Converts a handler failure into a recovery flow under the catch policy
pub trait ErrorTransform: Send + Sync {
    fn convert(&self, action: &Action, error: &DispatchError) -> ActionFlow;
}

impl<F> ErrorTransform for F
where
    F: Fn(&Action, &DispatchError) -> ActionFlow + Send + Sync,
{
    fn convert(&self, action: &Action, error: &DispatchError) -> ActionFlow {
        self(action, error)
    }
}

/// Strategy for executing one action across sibling handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanoutStrategy {
    /// Children start logically simultaneously as independent tasks
    Concurrent,
    /// Children run one after another in registration order
    Serial,
}

/// What a branch does when one of its children fails
#[derive(Clone)]
pub enum FailurePolicy {
    /// The first failure propagates; remaining siblings are no longer
    /// awaited (already-started siblings are not force-terminated)
    FailFast,
    /// Each failure is converted into a recovery flow and re-dispatched;
    /// the branch itself does not fail
    Catch(Arc<dyn ErrorTransform>),
}

impl fmt::Debug for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailFast => write!(f, "FailFast"),
            Self::Catch(_) => write!(f, "Catch(<transform>)"),
        }
    }
}

/// A node in a handler tree: either a single handler or a group of children
/// executed under one strategy and failure policy
#[derive(Clone)]
pub enum HandlerNode {
    Leaf(Arc<dyn ActionHandler>),
    Group {
        strategy: FanoutStrategy,
        policy: FailurePolicy,
        children: Vec<HandlerNode>,
    },
}

impl HandlerNode {
    /// A single handler leaf
    pub fn leaf(handler: impl ActionHandler + 'static) -> Self {
        Self::Leaf(Arc::new(handler))
    }

    /// A group node with an explicit strategy and policy
    pub fn group(strategy: FanoutStrategy, policy: FailurePolicy, children: Vec<HandlerNode>) -> Self {
        Self::Group {
            strategy,
            policy,
            children,
        }
    }

    /// A fail-fast concurrent group
    pub fn concurrent(children: Vec<HandlerNode>) -> Self {
        Self::group(FanoutStrategy::Concurrent, FailurePolicy::FailFast, children)
    }

    /// A fail-fast serial group
    pub fn serial(children: Vec<HandlerNode>) -> Self {
        Self::group(FanoutStrategy::Serial, FailurePolicy::FailFast, children)
    }

    /// Switch this node to the catch policy with the given recovery
    /// transform. A leaf is wrapped in a single-child serial group so the
    /// policy has a branch to apply to.
    pub fn catching(self, transform: Arc<dyn ErrorTransform>) -> Self {
        match self {
            Self::Group {
                strategy, children, ..
            } => Self::Group {
                strategy,
                policy: FailurePolicy::Catch(transform),
                children,
            },
            leaf @ Self::Leaf(_) => Self::Group {
                strategy: FanoutStrategy::Serial,
                policy: FailurePolicy::Catch(transform),
                children: vec![leaf],
            },
        }
    }

    /// Number of handler leaves in this subtree
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Group { children, .. } => children.iter().map(HandlerNode::leaf_count).sum(),
        }
    }
}

impl fmt::Debug for HandlerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(handler) => f
                .debug_tuple("Leaf")
                .field(&handler.handler_name())
                .finish(),
            Self::Group {
                strategy,
                policy,
                children,
            } => f
                .debug_struct("Group")
                .field("strategy", strategy)
                .field("policy", policy)
                .field("children", children)
                .finish(),
        }
    }
}
