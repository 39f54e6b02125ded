use std::collections::HashMap;
use std::time::Duration;

use crate::constants::system;
use crate::dispatch::FanoutStrategy;
use crate::error::{RelayError, Result};

/// Engine configuration with environment-variable overrides.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Cap on concurrently running handler invocations across the engine
    pub max_concurrent_handlers: usize,
    /// Timeout applied to each individual handler invocation
    pub handler_timeout: Duration,
    /// Capacity of the lifecycle event broadcast channel
    pub event_channel_capacity: usize,
    /// Fan-out strategy applied across top-level handler registrations
    pub root_strategy: FanoutStrategy,
    pub custom_settings: HashMap<String, String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_concurrent_handlers: system::DEFAULT_MAX_CONCURRENT_HANDLERS,
            handler_timeout: Duration::from_millis(system::DEFAULT_HANDLER_TIMEOUT_MS),
            event_channel_capacity: system::DEFAULT_EVENT_CHANNEL_CAPACITY,
            root_strategy: FanoutStrategy::Concurrent,
            custom_settings: HashMap::new(),
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(max_concurrent) = std::env::var("RELAY_MAX_CONCURRENT_HANDLERS") {
            config.max_concurrent_handlers = max_concurrent.parse().map_err(|e| {
                RelayError::ConfigurationError(format!("Invalid max_concurrent_handlers: {e}"))
            })?;
        }

        if let Ok(timeout_ms) = std::env::var("RELAY_HANDLER_TIMEOUT_MS") {
            let millis: u64 = timeout_ms.parse().map_err(|e| {
                RelayError::ConfigurationError(format!("Invalid handler_timeout_ms: {e}"))
            })?;
            config.handler_timeout = Duration::from_millis(millis);
        }

        if let Ok(capacity) = std::env::var("RELAY_EVENT_CHANNEL_CAPACITY") {
            config.event_channel_capacity = capacity.parse().map_err(|e| {
                RelayError::ConfigurationError(format!("Invalid event_channel_capacity: {e}"))
            })?;
        }

        if let Ok(strategy) = std::env::var("RELAY_ROOT_STRATEGY") {
            config.root_strategy = match strategy.as_str() {
                "concurrent" => FanoutStrategy::Concurrent,
                "serial" => FanoutStrategy::Serial,
                other => {
                    return Err(RelayError::ConfigurationError(format!(
                        "Invalid root_strategy: {other}"
                    )))
                }
            };
        }

        Ok(config)
    }
}
