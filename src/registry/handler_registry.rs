//! # Handler Registry
//!
//! Registry for handler-tree registrations with thread-safe operations.
//!
//! Registrations are kept in insertion order because serial root fan-out
//! runs them in registration order. A registration may be scoped to an
//! [`ActionGroup`]; the scope is fixed at registration time and resolution
//! is a membership test against it — no per-call inspection of handler
//! internals.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::action::{Action, ActionGroup};
use crate::dispatch::HandlerNode;
use crate::error::{RelayError, Result};

/// One handler-tree registration
#[derive(Debug, Clone)]
pub struct HandlerRegistration {
    pub identity: String,
    /// Names this registration receives; `None` means every action
    pub scope: Option<ActionGroup>,
    pub node: HandlerNode,
    pub registered_at: DateTime<Utc>,
}

/// Registry statistics
#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub total_registrations: usize,
    pub scoped_registrations: usize,
    pub total_handlers: usize,
}

/// Insertion-ordered registry of handler trees
pub struct HandlerRegistry {
    entries: RwLock<Vec<HandlerRegistration>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register a handler tree under an identity. Re-registering an
    /// existing identity replaces its tree in place, keeping its position
    /// in registration order.
    pub async fn register(&self, identity: &str, scope: Option<ActionGroup>, node: HandlerNode) {
        let registration = HandlerRegistration {
            identity: identity.to_string(),
            scope,
            node,
            registered_at: Utc::now(),
        };

        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|entry| entry.identity == identity) {
            Some(existing) => {
                debug!(identity = identity, "Replacing handler registration");
                *existing = registration;
            }
            None => {
                info!(identity = identity, "Registered handler");
                entries.push(registration);
            }
        }
    }

    /// Remove a registration by identity
    pub async fn unregister(&self, identity: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|entry| entry.identity != identity);

        if entries.len() == before {
            return Err(RelayError::RegistryError(format!(
                "Handler '{identity}' not found"
            )));
        }

        info!(identity = identity, "Unregistered handler");
        Ok(())
    }

    /// Handler trees that should receive the given action, in registration
    /// order
    pub async fn nodes_for(&self, action: &Action) -> Vec<HandlerNode> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|entry| match &entry.scope {
                Some(group) => group.contains(action),
                None => true,
            })
            .map(|entry| entry.node.clone())
            .collect()
    }

    /// Identities of all registrations, in registration order
    pub async fn list_identities(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|entry| entry.identity.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Get registry statistics
    pub async fn stats(&self) -> RegistryStats {
        let entries = self.entries.read().await;
        RegistryStats {
            total_registrations: entries.len(),
            scoped_registrations: entries.iter().filter(|e| e.scope.is_some()).count(),
            total_handlers: entries.iter().map(|e| e.node.leaf_count()).sum(),
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
