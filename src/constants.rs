//! # System Constants
//!
//! Lifecycle event names and operational limits for the relay dispatch
//! engine.

// Re-export state types for convenience
pub use crate::state_machine::TraversalState as TraversalStatus;

/// Dispatch lifecycle events published through the event system
pub mod events {
    // Traversal lifecycle events
    pub const DISPATCH_STARTED: &str = "action.dispatch.started";
    pub const DISPATCH_COMPLETED: &str = "action.dispatch.completed";
    pub const DISPATCH_FAILED: &str = "action.dispatch.failed";
    pub const DISPATCH_REDIRECTED: &str = "action.dispatch.redirected";
    pub const DISPATCH_PARKED: &str = "action.dispatch.parked";
    pub const DISPATCH_SUPERSEDED: &str = "action.dispatch.superseded";

    // Deferral events
    pub const DEFERRAL_RESOLVED: &str = "deferral.resolved";
    pub const DEFERRAL_PURGED: &str = "deferral.purged";

    // Handler events
    pub const HANDLER_FAILURE_CAUGHT: &str = "handler.failure_caught";
    pub const HANDLER_FOLLOWUP_SPAWNED: &str = "handler.followup_spawned";

    // Engine events
    pub const ENGINE_RESET: &str = "engine.reset";
}

/// System-wide constants
pub mod system {
    /// Unknown value placeholder
    pub const UNKNOWN: &str = "unknown";

    /// Version compatibility marker
    pub const RELAY_CORE_VERSION: &str = "0.1.0";

    /// Default capacity of the lifecycle event channel
    pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;

    /// Default cap on concurrently running handler invocations
    pub const DEFAULT_MAX_CONCURRENT_HANDLERS: usize = 10;

    /// Default timeout for a single handler invocation, in milliseconds
    pub const DEFAULT_HANDLER_TIMEOUT_MS: u64 = 30_000;
}
