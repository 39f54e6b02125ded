//! # Fan-out Executor
//!
//! Drives one action across a set or tree of handlers. Concurrent groups
//! spawn their children as independent tasks and collect results as they
//! resolve; serial groups run children in registration order. Failure
//! handling is per-branch: fail-fast propagates the first failure without
//! awaiting further siblings, catch converts each failure into a recovery
//! flow through the branch's registered transform and keeps going.
//!
//! Every leaf invocation acquires a permit from the engine-wide concurrency
//! semaphore and runs under the configured handler timeout.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::json;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::action::Action;
use crate::constants::events;
use crate::dispatch::coordinator::DispatchHandle;
use crate::dispatch::errors::{DispatchError, DispatchResult};
use crate::dispatch::handler::{
    ActionHandler, ErrorTransform, FailurePolicy, FanoutStrategy, HandlerNode,
};
use crate::events::EventPublisher;

/// Executor for concurrent and serial handler fan-out
#[derive(Clone)]
pub struct FanoutExecutor {
    semaphore: Arc<Semaphore>,
    handler_timeout: Duration,
    publisher: EventPublisher,
}

impl FanoutExecutor {
    pub fn new(
        max_concurrent_handlers: usize,
        handler_timeout: Duration,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent_handlers)),
            handler_timeout,
            publisher,
        }
    }

    /// Execute one action against the given top-level nodes under the root
    /// strategy. The root behaves as a fail-fast group: a failure that no
    /// catch branch absorbed propagates to the dispatch caller.
    pub(crate) async fn execute(
        &self,
        action: &Action,
        nodes: Vec<HandlerNode>,
        root_strategy: FanoutStrategy,
        dispatcher: DispatchHandle,
    ) -> DispatchResult<()> {
        if nodes.is_empty() {
            debug!(action = action.name(), "No handlers registered for action");
            return Ok(());
        }

        let root = HandlerNode::group(root_strategy, FailurePolicy::FailFast, nodes);
        self.execute_node(action.clone(), root, dispatcher).await
    }

    /// Execute a single node of the handler tree. Boxed so the tree can
    /// recurse and so concurrent children can be spawned as owned tasks.
    fn execute_node(
        &self,
        action: Action,
        node: HandlerNode,
        dispatcher: DispatchHandle,
    ) -> BoxFuture<'static, DispatchResult<()>> {
        let executor = self.clone();
        async move {
            match node {
                HandlerNode::Leaf(handler) => {
                    executor.invoke_leaf(&action, handler, &dispatcher).await
                }
                HandlerNode::Group {
                    strategy: FanoutStrategy::Serial,
                    policy,
                    children,
                } => {
                    executor
                        .execute_serial(action, children, policy, dispatcher)
                        .await
                }
                HandlerNode::Group {
                    strategy: FanoutStrategy::Concurrent,
                    policy,
                    children,
                } => {
                    executor
                        .execute_concurrent(action, children, policy, dispatcher)
                        .await
                }
            }
        }
        .boxed()
    }

    /// Run children one after another in registration order
    async fn execute_serial(
        &self,
        action: Action,
        children: Vec<HandlerNode>,
        policy: FailurePolicy,
        dispatcher: DispatchHandle,
    ) -> DispatchResult<()> {
        for child in children {
            let result = self
                .execute_node(action.clone(), child, dispatcher.clone())
                .await;

            if let Err(error) = result {
                match &policy {
                    FailurePolicy::FailFast => return Err(error),
                    FailurePolicy::Catch(transform) => {
                        self.recover(&action, error, transform.as_ref(), &dispatcher)
                            .await;
                    }
                }
            }
        }

        Ok(())
    }

    /// Start all children as independent tasks and collect their results as
    /// they resolve
    async fn execute_concurrent(
        &self,
        action: Action,
        children: Vec<HandlerNode>,
        policy: FailurePolicy,
        dispatcher: DispatchHandle,
    ) -> DispatchResult<()> {
        let mut tasks: FuturesUnordered<_> = children
            .into_iter()
            .map(|child| tokio::spawn(self.execute_node(action.clone(), child, dispatcher.clone())))
            .collect();

        while let Some(joined) = tasks.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(join_error) if join_error.is_panic() => Err(DispatchError::HandlerPanicked {
                    action: action.name().to_string(),
                    reason: join_error.to_string(),
                }),
                Err(join_error) => Err(DispatchError::Internal(format!(
                    "Handler task cancelled: {join_error}"
                ))),
            };

            if let Err(error) = result {
                match &policy {
                    FailurePolicy::FailFast => {
                        // Dropping the remaining join handles stops awaiting
                        // started siblings; their results are ignored
                        return Err(error);
                    }
                    FailurePolicy::Catch(transform) => {
                        self.recover(&action, error, transform.as_ref(), &dispatcher)
                            .await;
                    }
                }
            }
        }

        Ok(())
    }

    /// Invoke one handler under the concurrency cap and timeout. A returned
    /// follow-up flow is re-dispatched fire-and-continue; the action counts
    /// as processed once the handler itself returns.
    async fn invoke_leaf(
        &self,
        action: &Action,
        handler: Arc<dyn ActionHandler>,
        dispatcher: &DispatchHandle,
    ) -> DispatchResult<()> {
        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DispatchError::Internal(format!("Executor semaphore closed: {e}")))?;

        let handler_name = handler.handler_name().to_string();
        debug!(
            action = action.name(),
            handler = %handler_name,
            "Invoking handler"
        );

        match timeout(self.handler_timeout, handler.handle(action)).await {
            Ok(Ok(Some(followup))) => {
                if !followup.is_empty() {
                    self.publisher.publish(
                        events::HANDLER_FOLLOWUP_SPAWNED,
                        json!({
                            "action": action.name(),
                            "handler": handler_name,
                            "followup_len": followup.len(),
                        }),
                    );
                    dispatcher.spawn_flow(followup);
                }
                Ok(())
            }
            Ok(Ok(None)) => Ok(()),
            Ok(Err(error)) => Err(DispatchError::HandlerFailed {
                action: action.name().to_string(),
                handler: handler_name,
                reason: error.to_string(),
            }),
            Err(_) => Err(DispatchError::HandlerTimeout {
                action: action.name().to_string(),
                handler: handler_name,
                timeout_ms: self.handler_timeout.as_millis() as u64,
            }),
        }
    }

    /// Convert a caught failure into a recovery flow and dispatch it. The
    /// recovery dispatch is awaited so completion order stays deterministic;
    /// a failing recovery is observed and logged, never re-raised into the
    /// branch.
    async fn recover(
        &self,
        action: &Action,
        error: DispatchError,
        transform: &dyn ErrorTransform,
        dispatcher: &DispatchHandle,
    ) {
        warn!(
            action = action.name(),
            error = %error,
            "Handler failure caught; dispatching recovery flow"
        );

        let recovery = transform.convert(action, &error);
        self.publisher.publish(
            events::HANDLER_FAILURE_CAUGHT,
            json!({
                "action": action.name(),
                "error": error.to_string(),
                "recovery_len": recovery.len(),
            }),
        );

        if let Err(recovery_error) = dispatcher.dispatch_flow(recovery).await {
            warn!(
                action = action.name(),
                error = %recovery_error,
                "Recovery flow failed"
            );
        }
    }
}
