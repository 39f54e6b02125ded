//! Shared handlers and middleware for the integration suites.

#![allow(dead_code)]

pub mod strategies;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use relay_core::action::{Action, ActionFlow, ActionGroup};
use relay_core::dispatch::{
    ActionHandler, DeferralMode, DispatchError, DispatchResult, Middleware, MiddlewareContext,
    PreOutcome,
};

/// Handler that records the names of the actions it sees
pub struct RecordingHandler {
    name: String,
    seen: Arc<Mutex<Vec<String>>>,
}

impl RecordingHandler {
    pub fn new(name: &str) -> (Self, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                name: name.to_string(),
                seen: seen.clone(),
            },
            seen,
        )
    }
}

#[async_trait]
impl ActionHandler for RecordingHandler {
    async fn handle(&self, action: &Action) -> anyhow::Result<Option<ActionFlow>> {
        self.seen.lock().push(action.name().to_string());
        Ok(None)
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Handler that fails every action it receives
pub struct FailingHandler {
    name: String,
}

impl FailingHandler {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl ActionHandler for FailingHandler {
    async fn handle(&self, action: &Action) -> anyhow::Result<Option<ActionFlow>> {
        anyhow::bail!("{} cannot process {}", self.name, action.name())
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Handler that emits a follow-up flow for a specific trigger action
pub struct FollowupHandler {
    trigger: String,
    followup: ActionFlow,
}

impl FollowupHandler {
    pub fn new(trigger: &str, followup: ActionFlow) -> Self {
        Self {
            trigger: trigger.to_string(),
            followup,
        }
    }
}

#[async_trait]
impl ActionHandler for FollowupHandler {
    async fn handle(&self, action: &Action) -> anyhow::Result<Option<ActionFlow>> {
        if action.name() == self.trigger {
            Ok(Some(self.followup.clone()))
        } else {
            Ok(None)
        }
    }

    fn handler_name(&self) -> &str {
        "followup_handler"
    }
}

/// Handler that sleeps before recording, for timeout and supersession tests
pub struct SlowHandler {
    delay: Duration,
    seen: Arc<Mutex<Vec<String>>>,
}

impl SlowHandler {
    pub fn new(delay: Duration) -> (Self, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                delay,
                seen: seen.clone(),
            },
            seen,
        )
    }
}

#[async_trait]
impl ActionHandler for SlowHandler {
    async fn handle(&self, action: &Action) -> anyhow::Result<Option<ActionFlow>> {
        tokio::time::sleep(self.delay).await;
        self.seen.lock().push(action.name().to_string());
        Ok(None)
    }

    fn handler_name(&self) -> &str {
        "slow_handler"
    }
}

/// Middleware that redirects one action name to a replacement flow
pub struct RedirectWhen {
    from: String,
    to: ActionFlow,
}

impl RedirectWhen {
    pub fn new(from: &str, to: ActionFlow) -> Self {
        Self {
            from: from.to_string(),
            to,
        }
    }
}

#[async_trait]
impl Middleware for RedirectWhen {
    async fn pre(&self, action: &Action, _ctx: &MiddlewareContext) -> DispatchResult<PreOutcome> {
        if action.name() == self.from {
            Ok(PreOutcome::Redirect(self.to.clone()))
        } else {
            Ok(PreOutcome::Continue)
        }
    }

    fn middleware_name(&self) -> &str {
        "redirect_when"
    }
}

/// Middleware that defers one action name on a prerequisite, every time it
/// is evaluated. Suitable for look-behind policies, which the engine
/// re-evaluates against history on re-admission.
pub struct DeferWhen {
    action_name: String,
    prerequisite: String,
    mode: DeferralMode,
}

impl DeferWhen {
    pub fn new(action_name: &str, prerequisite: &str, mode: DeferralMode) -> Self {
        Self {
            action_name: action_name.to_string(),
            prerequisite: prerequisite.to_string(),
            mode,
        }
    }
}

#[async_trait]
impl Middleware for DeferWhen {
    async fn pre(&self, action: &Action, _ctx: &MiddlewareContext) -> DispatchResult<PreOutcome> {
        if action.name() == self.action_name {
            Ok(PreOutcome::Defer {
                prerequisite: self.prerequisite.clone(),
                mode: self.mode,
            })
        } else {
            Ok(PreOutcome::Continue)
        }
    }

    fn middleware_name(&self) -> &str {
        "defer_when"
    }
}

/// Middleware that defers one action name exactly once, then continues on
/// re-admission. Needed for look-ahead policies, which would otherwise park
/// the action again every time it re-enters the pre stage.
pub struct DeferOnce {
    action_name: String,
    prerequisite: String,
    mode: DeferralMode,
    deferred: AtomicBool,
}

impl DeferOnce {
    pub fn new(action_name: &str, prerequisite: &str, mode: DeferralMode) -> Self {
        Self {
            action_name: action_name.to_string(),
            prerequisite: prerequisite.to_string(),
            mode,
            deferred: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Middleware for DeferOnce {
    async fn pre(&self, action: &Action, _ctx: &MiddlewareContext) -> DispatchResult<PreOutcome> {
        if action.name() == self.action_name && !self.deferred.swap(true, Ordering::SeqCst) {
            Ok(PreOutcome::Defer {
                prerequisite: self.prerequisite.clone(),
                mode: self.mode,
            })
        } else {
            Ok(PreOutcome::Continue)
        }
    }

    fn middleware_name(&self) -> &str {
        "defer_once"
    }
}

/// Middleware that rejects any action whose name is in the given group
pub struct GateWhen {
    denied: ActionGroup,
}

impl GateWhen {
    pub fn new(denied: ActionGroup) -> Self {
        Self { denied }
    }
}

#[async_trait]
impl Middleware for GateWhen {
    async fn pre(&self, action: &Action, _ctx: &MiddlewareContext) -> DispatchResult<PreOutcome> {
        if self.denied.contains(action) {
            Err(DispatchError::gated(
                action.name(),
                "gate_when",
                "access denied",
            ))
        } else {
            Ok(PreOutcome::Continue)
        }
    }

    fn middleware_name(&self) -> &str {
        "gate_when"
    }
}

/// Shared hook counters, split from the middleware so tests keep a view
/// after registration consumes the middleware value
#[derive(Default)]
pub struct HookCounts {
    pub pre_calls: AtomicUsize,
    pub post_calls: AtomicUsize,
    pub failure_calls: AtomicUsize,
}

/// Middleware that counts its pre/post/failure invocations
pub struct CountingMiddleware {
    counts: Arc<HookCounts>,
}

impl CountingMiddleware {
    pub fn new() -> (Self, Arc<HookCounts>) {
        let counts = Arc::new(HookCounts::default());
        (
            Self {
                counts: counts.clone(),
            },
            counts,
        )
    }
}

#[async_trait]
impl Middleware for CountingMiddleware {
    async fn pre(&self, _action: &Action, _ctx: &MiddlewareContext) -> DispatchResult<PreOutcome> {
        self.counts.pre_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PreOutcome::Continue)
    }

    async fn post(&self, _action: &Action, _ctx: &MiddlewareContext) {
        self.counts.post_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn failure(&self, _action: &Action, _error: &DispatchError, _ctx: &MiddlewareContext) {
        self.counts.failure_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn middleware_name(&self) -> &str {
        "counting"
    }
}

/// Names recorded in history, for compact assertions
pub fn history_names(engine: &relay_core::DispatchCoordinator) -> Vec<String> {
    engine
        .history()
        .iter()
        .map(|action| action.name().to_string())
        .collect()
}

/// Await until history reaches the expected length, for fire-and-continue
/// follow-up assertions
pub async fn wait_for_history_len(engine: &relay_core::DispatchCoordinator, expected: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while engine.history().len() < expected {
        if tokio::time::Instant::now() > deadline {
            panic!(
                "history never reached {expected} entries: {:?}",
                history_names(engine)
            );
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
