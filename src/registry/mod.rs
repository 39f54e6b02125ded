//! # Registry
//!
//! Registration and per-action resolution of handler trees.

pub mod handler_registry;

pub use handler_registry::{HandlerRegistration, HandlerRegistry, RegistryStats};
