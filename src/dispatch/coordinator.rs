//! # Dispatch Coordinator
//!
//! The façade over the dispatch pipeline: accepts an action or flow, runs
//! the middleware pre stage, resolves redirects and deferrals, fans the
//! action out across the registered handler trees, notifies post/failure
//! hooks, appends history, and re-admits actions whose prerequisite just
//! completed.
//!
//! ## Ordering guarantees
//!
//! - Actions within one flow are processed strictly in the flow's order; an
//!   error aborts the remainder of that flow only.
//! - History append order is completion order.
//! - Actions deferred on the same prerequisite are re-admitted in the order
//!   they were parked, as independent flows after the current flow finishes.
//!
//! ## Cancellation
//!
//! Dispatching an action while a prior single-action dispatch of the same
//! name is still in flight aborts the prior traversal first (last-writer-wins
//! per action identity); the superseded caller observes
//! [`DispatchError::Superseded`].

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use serde_json::json;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::action::{Action, ActionFlow, ActionGroup};
use crate::config::RelayConfig;
use crate::constants::events;
use crate::dispatch::deferral::{DeferralMode, DeferralQueue, DeferralRecord};
use crate::dispatch::errors::{DispatchError, DispatchResult};
use crate::dispatch::executor::FanoutExecutor;
use crate::dispatch::handler::HandlerNode;
use crate::dispatch::history::{CompletedAction, HistoryLog};
use crate::dispatch::middleware::{Middleware, MiddlewareChain, MiddlewareContext, PreOutcome};
use crate::events::{EventPublisher, PublishedEvent};
use crate::registry::HandlerRegistry;
use crate::state_machine::{Traversal, TraversalEvent};

/// Selects which engine state a [`DispatchCoordinator::reset`] clears.
///
/// Clearing history does not clear outstanding deferrals; callers that need
/// both must also call [`DispatchCoordinator::purge_deferrals`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetScope {
    pub history: bool,
    pub handlers: bool,
    pub middleware: bool,
}

impl ResetScope {
    pub fn all() -> Self {
        Self {
            history: true,
            handlers: true,
            middleware: true,
        }
    }

    pub fn history_only() -> Self {
        Self {
            history: true,
            ..Self::default()
        }
    }
}

/// Result of one action's traversal through the pipeline
enum TraversalOutcome {
    /// The action completed; carries actions released from deferral queues
    Completed { resolved: Vec<DeferralRecord> },
    /// A pre hook replaced the action; the targets splice into the flow
    Redirected(ActionFlow),
    /// The action was parked; siblings in the flow continue
    Parked,
}

struct InFlightDispatch {
    dispatch_uuid: Uuid,
    abort: AbortHandle,
}

struct CoordinatorInner {
    config: RelayConfig,
    middleware: MiddlewareChain,
    registry: HandlerRegistry,
    history: Arc<HistoryLog>,
    deferrals: Arc<DeferralQueue>,
    executor: FanoutExecutor,
    publisher: EventPublisher,
    in_flight: DashMap<String, InFlightDispatch>,
}

/// The engine façade. Cheap to clone; clones share all engine state.
#[derive(Clone)]
pub struct DispatchCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl DispatchCoordinator {
    pub fn new() -> Self {
        Self::with_config(RelayConfig::default())
    }

    pub fn with_config(config: RelayConfig) -> Self {
        let publisher = EventPublisher::new(config.event_channel_capacity);
        let executor = FanoutExecutor::new(
            config.max_concurrent_handlers,
            config.handler_timeout,
            publisher.clone(),
        );

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                middleware: MiddlewareChain::new(),
                registry: HandlerRegistry::new(),
                history: Arc::new(HistoryLog::new()),
                deferrals: Arc::new(DeferralQueue::new()),
                executor,
                publisher,
                in_flight: DashMap::new(),
            }),
        }
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Append a middleware to the chain. Order of registration is order of
    /// evaluation.
    pub async fn register_middleware(&self, middleware: impl Middleware + 'static) {
        self.inner.middleware.register(Arc::new(middleware)).await;
    }

    /// Register a handler tree under an identity, receiving every action
    pub async fn register_handler(&self, identity: &str, node: HandlerNode) {
        self.inner.registry.register(identity, None, node).await;
    }

    /// Register a handler tree that only receives actions whose name is in
    /// the given group
    pub async fn register_handler_scoped(
        &self,
        identity: &str,
        scope: ActionGroup,
        node: HandlerNode,
    ) {
        self.inner.registry.register(identity, Some(scope), node).await;
    }

    /// Remove the handler registration with the given identity
    pub async fn unregister(&self, identity: &str) -> crate::error::Result<()> {
        self.inner.registry.unregister(identity).await
    }

    // ---------------------------------------------------------------------
    // Dispatch presentations
    // ---------------------------------------------------------------------

    /// Dispatch a single action and await its outcome.
    ///
    /// This is the identity-tracked presentation: a newer dispatch of the
    /// same action name aborts this one, which then resolves with
    /// [`DispatchError::Superseded`].
    pub async fn dispatch(&self, action: Action) -> DispatchResult<()> {
        let identity = action.name().to_string();
        let dispatch_uuid = Uuid::new_v4();

        // Last-writer-wins: cancel the prior in-flight traversal for this
        // identity before starting the new one
        if let Some((_, prior)) = self.inner.in_flight.remove(&identity) {
            prior.abort.abort();
            debug!(action = %identity, "Superseding prior in-flight dispatch");
            self.inner.publisher.publish(
                events::DISPATCH_SUPERSEDED,
                json!({ "action": identity }),
            );
        }

        let this = self.clone();
        let flow = ActionFlow::single(action);
        let task = tokio::spawn(async move { this.run_flow(flow).await });

        self.inner.in_flight.insert(
            identity.clone(),
            InFlightDispatch {
                dispatch_uuid,
                abort: task.abort_handle(),
            },
        );

        let result = match task.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_cancelled() => Err(DispatchError::Superseded {
                action: identity.clone(),
            }),
            Err(join_error) => Err(DispatchError::Internal(format!(
                "Dispatch task failed: {join_error}"
            ))),
        };

        self.inner
            .in_flight
            .remove_if(&identity, |_, entry| entry.dispatch_uuid == dispatch_uuid);

        result
    }

    /// Dispatch an ordered flow of actions and await its outcome. An error
    /// on any action aborts the actions that follow it in the flow.
    pub async fn dispatch_flow(&self, flow: ActionFlow) -> DispatchResult<()> {
        self.run_flow(flow).await
    }

    /// Callback presentation of [`DispatchCoordinator::dispatch`]; the
    /// callback receives the same outcome the future form would return.
    pub fn dispatch_with_callback(
        &self,
        action: Action,
        callback: impl FnOnce(DispatchResult<()>) + Send + 'static,
    ) {
        let this = self.clone();
        tokio::spawn(async move {
            let result = this.dispatch(action).await;
            callback(result);
        });
    }

    /// Callback presentation of [`DispatchCoordinator::dispatch_flow`]
    pub fn dispatch_flow_with_callback(
        &self,
        flow: ActionFlow,
        callback: impl FnOnce(DispatchResult<()>) + Send + 'static,
    ) {
        let this = self.clone();
        tokio::spawn(async move {
            let result = this.dispatch_flow(flow).await;
            callback(result);
        });
    }

    /// Blocking presentation of [`DispatchCoordinator::dispatch`].
    ///
    /// Must be called from a worker thread of a multi-thread Tokio runtime;
    /// the calling worker is released to the blocking pool while dispatch
    /// runs.
    pub fn dispatch_blocking(&self, action: Action) -> DispatchResult<()> {
        let this = self.clone();
        tokio::task::block_in_place(move || {
            tokio::runtime::Handle::current().block_on(this.dispatch(action))
        })
    }

    /// Blocking presentation of [`DispatchCoordinator::dispatch_flow`]; the
    /// same runtime requirements as [`DispatchCoordinator::dispatch_blocking`]
    /// apply.
    pub fn dispatch_flow_blocking(&self, flow: ActionFlow) -> DispatchResult<()> {
        let this = self.clone();
        tokio::task::block_in_place(move || {
            tokio::runtime::Handle::current().block_on(this.dispatch_flow(flow))
        })
    }

    // ---------------------------------------------------------------------
    // Introspection and maintenance
    // ---------------------------------------------------------------------

    /// Engine configuration, including caller-supplied custom settings
    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    /// Completed actions in completion order
    pub fn history(&self) -> Vec<Action> {
        self.inner.history.snapshot()
    }

    /// Completed actions with traversal metadata
    pub fn history_entries(&self) -> Vec<CompletedAction> {
        self.inner.history.entries()
    }

    /// Subscribe to dispatch lifecycle events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PublishedEvent> {
        self.inner.publisher.subscribe()
    }

    /// Total parked actions across all prerequisites
    pub fn deferred_count(&self) -> usize {
        self.inner.deferrals.total_waiting()
    }

    /// Parked actions waiting on one prerequisite name
    pub fn deferred_count_for(&self, prerequisite: &str) -> usize {
        self.inner.deferrals.waiting_count(prerequisite)
    }

    /// Selectively clear engine state. Deferral queues are untouched; use
    /// [`DispatchCoordinator::purge_deferrals`] to drop parked actions.
    pub async fn reset(&self, scope: ResetScope) {
        if scope.history {
            self.inner.history.clear();
        }
        if scope.handlers {
            self.inner.registry.clear().await;
        }
        if scope.middleware {
            self.inner.middleware.clear().await;
        }

        info!(
            history = scope.history,
            handlers = scope.handlers,
            middleware = scope.middleware,
            "Engine state reset"
        );
        self.inner.publisher.publish(
            events::ENGINE_RESET,
            json!({
                "history": scope.history,
                "handlers": scope.handlers,
                "middleware": scope.middleware,
            }),
        );
    }

    /// Drop every parked action, returning how many were discarded
    pub fn purge_deferrals(&self) -> usize {
        let purged = self.inner.deferrals.purge_all();
        if purged > 0 {
            self.inner
                .publisher
                .publish(events::DEFERRAL_PURGED, json!({ "purged": purged }));
        }
        purged
    }

    // ---------------------------------------------------------------------
    // Pipeline internals
    // ---------------------------------------------------------------------

    /// Process a flow action-by-action, splicing in redirect targets and
    /// queueing flows released from deferral after the current flow ends.
    async fn run_flow(&self, flow: ActionFlow) -> DispatchResult<()> {
        if flow.is_empty() {
            // No middleware fires and history is untouched
            return Ok(());
        }

        let mut flows: VecDeque<(ActionFlow, bool)> = VecDeque::new();
        flows.push_back((flow, true));
        let mut outcome = Ok(());

        while let Some((flow, primary)) = flows.pop_front() {
            let mut pending: VecDeque<Action> = flow.into_iter().collect();

            while let Some(action) = pending.pop_front() {
                match self.traverse(action).await {
                    Ok(TraversalOutcome::Completed { resolved }) => {
                        // Re-admitted actions run as independent flows after
                        // this flow, preserving the order they were parked
                        for record in resolved {
                            flows.push_back((ActionFlow::single(record.action), false));
                        }
                    }
                    Ok(TraversalOutcome::Redirected(targets)) => {
                        for target in targets.into_iter().rev() {
                            pending.push_front(target);
                        }
                    }
                    Ok(TraversalOutcome::Parked) => {}
                    Err(error) => {
                        if primary {
                            outcome = Err(error);
                        } else {
                            // A re-admitted flow has no live caller; the
                            // failure was already announced to hooks
                            warn!(error = %error, "Re-admitted deferred flow failed");
                        }
                        // Abort the remaining actions of this flow only
                        break;
                    }
                }
            }
        }

        outcome
    }

    /// One action's traversal: pre stage, fan-out, post/failure hooks,
    /// history append, and deferral resolution.
    async fn traverse(&self, action: Action) -> DispatchResult<TraversalOutcome> {
        let mut traversal = Traversal::begin(action.name());
        let ctx = MiddlewareContext::new(
            self.inner.history.clone(),
            self.inner.deferrals.clone(),
        );

        self.inner.publisher.publish(
            events::DISPATCH_STARTED,
            json!({
                "action": action.name(),
                "traversal_uuid": traversal.traversal_uuid(),
            }),
        );

        match self.inner.middleware.evaluate_pre(&action, &ctx).await {
            Err(error) => {
                // A pre error gates the action: handlers are skipped and
                // every failure hook observes the rejection
                traversal.advance(TraversalEvent::Fail)?;
                self.inner.middleware.notify_failure(&action, &error, &ctx).await;
                self.inner.publisher.publish(
                    events::DISPATCH_FAILED,
                    json!({
                        "action": action.name(),
                        "traversal_uuid": traversal.traversal_uuid(),
                        "error": error.to_string(),
                    }),
                );
                return Err(error);
            }
            Ok(PreOutcome::Redirect(targets)) => {
                debug!(
                    action = action.name(),
                    target_count = targets.len(),
                    "Action redirected"
                );
                self.inner.publisher.publish(
                    events::DISPATCH_REDIRECTED,
                    json!({
                        "action": action.name(),
                        "traversal_uuid": traversal.traversal_uuid(),
                        "targets": targets.iter().map(Action::name).collect::<Vec<_>>(),
                    }),
                );
                return Ok(TraversalOutcome::Redirected(targets));
            }
            Ok(PreOutcome::Defer { prerequisite, mode }) => {
                let admit_now = mode == DeferralMode::LookBehind
                    && self.inner.history.contains(&prerequisite);

                if !admit_now {
                    traversal.advance(TraversalEvent::Park)?;
                    self.inner.publisher.publish(
                        events::DISPATCH_PARKED,
                        json!({
                            "action": action.name(),
                            "traversal_uuid": traversal.traversal_uuid(),
                            "prerequisite": prerequisite,
                            "mode": mode,
                        }),
                    );
                    self.inner.deferrals.park(prerequisite, action, mode);
                    return Ok(TraversalOutcome::Parked);
                }

                debug!(
                    action = action.name(),
                    prerequisite = %prerequisite,
                    "Look-behind prerequisite already completed; admitting now"
                );
            }
            Ok(PreOutcome::Continue) => {}
        }

        traversal.advance(TraversalEvent::Admit)?;

        let nodes = self.inner.registry.nodes_for(&action).await;
        let handle = DispatchHandle::new(self.clone());
        let execution = self
            .inner
            .executor
            .execute(&action, nodes, self.inner.config.root_strategy, handle)
            .await;

        match execution {
            Err(error) => {
                traversal.advance(TraversalEvent::Fail)?;
                self.inner.middleware.notify_failure(&action, &error, &ctx).await;
                self.inner.publisher.publish(
                    events::DISPATCH_FAILED,
                    json!({
                        "action": action.name(),
                        "traversal_uuid": traversal.traversal_uuid(),
                        "error": error.to_string(),
                    }),
                );
                Err(error)
            }
            Ok(()) => {
                traversal.advance(TraversalEvent::Succeed)?;
                self.inner.middleware.notify_post(&action, &ctx).await;
                self.inner
                    .history
                    .append(action.clone(), traversal.traversal_uuid());

                let resolved = self.inner.deferrals.take_waiting(action.name());
                if !resolved.is_empty() {
                    self.inner.publisher.publish(
                        events::DEFERRAL_RESOLVED,
                        json!({
                            "prerequisite": action.name(),
                            "released": resolved.len(),
                        }),
                    );
                }

                self.inner.publisher.publish(
                    events::DISPATCH_COMPLETED,
                    json!({
                        "action": action.name(),
                        "traversal_uuid": traversal.traversal_uuid(),
                    }),
                );

                Ok(TraversalOutcome::Completed { resolved })
            }
        }
    }
}

impl Default for DispatchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-dispatch capability handed to the fan-out executor so handler
/// follow-ups and catch recoveries re-enter the pipeline at the
/// coordinator.
#[derive(Clone)]
pub struct DispatchHandle {
    coordinator: DispatchCoordinator,
}

impl DispatchHandle {
    pub(crate) fn new(coordinator: DispatchCoordinator) -> Self {
        Self { coordinator }
    }

    /// Fire-and-continue dispatch of a handler follow-up flow
    pub fn spawn_flow(&self, flow: ActionFlow) {
        if flow.is_empty() {
            return;
        }
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            if let Err(error) = coordinator.dispatch_flow(flow).await {
                warn!(error = %error, "Follow-up flow failed");
            }
        });
    }

    /// Awaited dispatch used for catch-policy recovery flows
    pub fn dispatch_flow(&self, flow: ActionFlow) -> BoxFuture<'static, DispatchResult<()>> {
        let coordinator = self.coordinator.clone();
        async move { coordinator.dispatch_flow(flow).await }.boxed()
    }
}
