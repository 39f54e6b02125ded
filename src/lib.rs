#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Relay Core
//!
//! In-process action dispatch and deferral engine.
//!
//! ## Overview
//!
//! Relay routes discrete, named **actions** through an ordered middleware
//! chain and out to registered handler trees, guaranteeing a deterministic,
//! auditable order of side effects. An action can be redirected to another
//! action, parked until a prerequisite action completes (look-behind or
//! look-ahead deferral), or fanned out concurrently or serially across many
//! handlers with per-branch error recovery.
//!
//! ## Architecture
//!
//! One dispatch is one **traversal**: middleware `pre` stage (first
//! non-continue outcome wins) → fan-out execution across handler trees →
//! middleware `post` or `failure` hooks → history append → re-admission of
//! actions whose prerequisite just completed. Handlers may emit follow-up
//! flows, which re-enter the pipeline as independent chains.
//!
//! ## Module Organization
//!
//! - [`action`] - Action, ActionFlow, and ActionGroup value types
//! - [`dispatch`] - Coordinator, middleware chain, deferral queue, fan-out
//!   executor, and history log
//! - [`registry`] - Handler-tree registration and per-action resolution
//! - [`state_machine`] - Traversal lifecycle states and transitions
//! - [`events`] - Lifecycle event publication
//! - [`config`] - Engine configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured tracing initialization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay_core::action::{Action, ActionFlow};
//! use relay_core::dispatch::{ActionHandler, DispatchCoordinator, HandlerNode};
//! use async_trait::async_trait;
//!
//! struct AuditHandler;
//!
//! #[async_trait]
//! impl ActionHandler for AuditHandler {
//!     async fn handle(&self, action: &Action) -> anyhow::Result<Option<ActionFlow>> {
//!         println!("observed {action}");
//!         Ok(None)
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DispatchCoordinator::new();
//! engine.register_handler("audit", HandlerNode::leaf(AuditHandler)).await;
//!
//! engine.dispatch(Action::named("login")).await?;
//! assert_eq!(engine.history().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;
pub mod state_machine;

pub use action::{Action, ActionFlow, ActionGroup};
pub use config::RelayConfig;
pub use dispatch::{
    ActionHandler, DeferralMode, DispatchCoordinator, DispatchError, DispatchResult,
    ErrorTransform, FailurePolicy, FanoutStrategy, HandlerNode, Middleware, MiddlewareContext,
    PreOutcome, ResetScope,
};
pub use error::{RelayError, Result};
pub use events::EventPublisher;
pub use state_machine::{TraversalEvent, TraversalState};
