//! # Dispatch Engine
//!
//! The action dispatch pipeline: middleware pre/post/failure hooks,
//! deferral parking and resolution, concurrent/serial handler fan-out with
//! per-branch failure policies, and the append-only completion history.
//!
//! ## Core Components
//!
//! - **DispatchCoordinator**: the façade accepting actions and flows and
//!   driving each traversal end to end
//! - **MiddlewareChain**: ordered gating/observational hooks around handler
//!   execution
//! - **FanoutExecutor**: concurrent and serial execution of one action over
//!   handler trees, with fail-fast and catch policies
//! - **DeferralQueue**: per-prerequisite FIFO parking for look-behind and
//!   look-ahead deferrals
//! - **HistoryLog**: completion-ordered record of fully processed actions

pub mod coordinator;
pub mod deferral;
pub mod errors;
pub mod executor;
pub mod handler;
pub mod history;
pub mod middleware;

// Re-export core types and components for easy access
pub use coordinator::{DispatchCoordinator, DispatchHandle, ResetScope};
pub use deferral::{DeferralMode, DeferralQueue, DeferralRecord};
pub use errors::{DispatchError, DispatchResult};
pub use executor::FanoutExecutor;
pub use handler::{
    ActionHandler, ErrorTransform, FailurePolicy, FanoutStrategy, HandlerNode,
};
pub use history::{CompletedAction, HistoryLog};
pub use middleware::{Middleware, MiddlewareChain, MiddlewareContext, PreOutcome};
