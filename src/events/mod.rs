// Event system for dispatch lifecycle notifications
//
// Subscribers observe traversal lifecycle events without participating in
// dispatch decisions; publication never gates or fails a dispatch.

pub mod publisher;

pub use publisher::{EventPublisher, PublishError, PublishedEvent};
