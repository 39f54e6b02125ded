//! # Middleware Chain
//!
//! Ordered pre/post/failure hooks evaluated around handler execution.
//!
//! The `pre` stage is gating: the first middleware to return something other
//! than [`PreOutcome::Continue`] decides the action's fate and the rest of
//! the chain is not consulted for that stage. Middleware encode mutually
//! exclusive policies (auth gating, admin gating, cross-action dependencies),
//! so evaluating further hooks after a decision would double-apply policy.
//! `post` and `failure` are observational and run on every middleware in
//! registration order.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::action::{Action, ActionFlow};
use crate::dispatch::deferral::{DeferralMode, DeferralQueue};
use crate::dispatch::errors::{DispatchError, DispatchResult};
use crate::dispatch::history::HistoryLog;

/// Decision returned by a middleware `pre` hook
#[derive(Debug, Clone)]
pub enum PreOutcome {
    /// Let the action proceed to the next middleware, then to handlers
    Continue,
    /// Replace the action with the given flow; its head restarts at the
    /// pre stage
    Redirect(ActionFlow),
    /// Park the action until the named prerequisite completes
    Defer {
        prerequisite: String,
        mode: DeferralMode,
    },
}

/// Read-only engine views handed to middleware hooks
#[derive(Clone)]
pub struct MiddlewareContext {
    history: Arc<HistoryLog>,
    deferrals: Arc<DeferralQueue>,
}

impl MiddlewareContext {
    pub(crate) fn new(history: Arc<HistoryLog>, deferrals: Arc<DeferralQueue>) -> Self {
        Self { history, deferrals }
    }

    /// Completed-action history (read-only)
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Deferral queue counts (read-only)
    pub fn deferrals(&self) -> &DeferralQueue {
        &self.deferrals
    }
}

/// Observer/gatekeeper invoked around handler execution.
///
/// A `pre` hook may also raise an error to reject the action outright; that
/// is treated like a handler failure: handlers are skipped, every `failure`
/// hook observes the error, and the flow aborts.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn pre(
        &self,
        _action: &Action,
        _ctx: &MiddlewareContext,
    ) -> DispatchResult<PreOutcome> {
        Ok(PreOutcome::Continue)
    }

    async fn post(&self, _action: &Action, _ctx: &MiddlewareContext) {}

    async fn failure(&self, _action: &Action, _error: &DispatchError, _ctx: &MiddlewareContext) {}

    /// Middleware name for identification
    fn middleware_name(&self) -> &str {
        "unnamed_middleware"
    }
}

/// Ordered list of middleware owned by the coordinator
pub struct MiddlewareChain {
    stack: RwLock<Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            stack: RwLock::new(Vec::new()),
        }
    }

    pub async fn register(&self, middleware: Arc<dyn Middleware>) {
        debug!(
            middleware = middleware.middleware_name(),
            "Registering middleware"
        );
        self.stack.write().await.push(middleware);
    }

    pub async fn clear(&self) {
        self.stack.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.stack.read().await.len()
    }

    /// Evaluate the `pre` stage left-to-right; the first non-Continue
    /// outcome short-circuits the rest of the chain
    pub(crate) async fn evaluate_pre(
        &self,
        action: &Action,
        ctx: &MiddlewareContext,
    ) -> DispatchResult<PreOutcome> {
        let chain = self.stack.read().await.clone();

        for middleware in chain {
            match middleware.pre(action, ctx).await? {
                PreOutcome::Continue => continue,
                decided => {
                    debug!(
                        action = action.name(),
                        middleware = middleware.middleware_name(),
                        "Pre stage short-circuited"
                    );
                    return Ok(decided);
                }
            }
        }

        Ok(PreOutcome::Continue)
    }

    /// Notify every middleware of a completed action, in registration order
    pub(crate) async fn notify_post(&self, action: &Action, ctx: &MiddlewareContext) {
        let chain = self.stack.read().await.clone();
        for middleware in chain {
            middleware.post(action, ctx).await;
        }
    }

    /// Announce an error to every middleware, in registration order.
    /// Observational only; a failure hook cannot suppress the error.
    pub(crate) async fn notify_failure(
        &self,
        action: &Action,
        error: &DispatchError,
        ctx: &MiddlewareContext,
    ) {
        let chain = self.stack.read().await.clone();
        for middleware in chain {
            middleware.failure(action, error, ctx).await;
        }
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}
