//! # Deferral Queue
//!
//! Per-prerequisite-name FIFO queues of actions parked until their
//! prerequisite completes. A parked action sits in exactly one queue and is
//! released exactly once, in the order it was parked; purges report what
//! they removed so nothing disappears silently.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::action::Action;

/// Admission mode for a deferred action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferralMode {
    /// Check history at deferral time; if the prerequisite already
    /// completed, admit immediately, otherwise wait for its next completion
    LookBehind,
    /// Wait for the prerequisite's next completion regardless of history
    LookAhead,
}

impl fmt::Display for DeferralMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LookBehind => write!(f, "look_behind"),
            Self::LookAhead => write!(f, "look_ahead"),
        }
    }
}

/// A parked action awaiting its prerequisite
#[derive(Debug, Clone)]
pub struct DeferralRecord {
    pub action: Action,
    pub prerequisite: String,
    pub mode: DeferralMode,
    pub parked_at: DateTime<Utc>,
}

/// Per-prerequisite-name FIFO queues of parked actions
#[derive(Debug, Default)]
pub struct DeferralQueue {
    queues: DashMap<String, VecDeque<DeferralRecord>>,
}

impl DeferralQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park an action until the named prerequisite next completes
    pub(crate) fn park(&self, prerequisite: String, action: Action, mode: DeferralMode) {
        debug!(
            action = action.name(),
            prerequisite = %prerequisite,
            mode = %mode,
            "Parking action until prerequisite completes"
        );

        let record = DeferralRecord {
            action,
            prerequisite: prerequisite.clone(),
            mode,
            parked_at: Utc::now(),
        };

        self.queues.entry(prerequisite).or_default().push_back(record);
    }

    /// Release every action parked on the given prerequisite, in the order
    /// they were parked
    pub(crate) fn take_waiting(&self, prerequisite: &str) -> Vec<DeferralRecord> {
        match self.queues.remove(prerequisite) {
            Some((_, queue)) => {
                let released: Vec<DeferralRecord> = queue.into_iter().collect();
                if !released.is_empty() {
                    info!(
                        prerequisite = prerequisite,
                        released = released.len(),
                        "Prerequisite completed; releasing deferred actions"
                    );
                }
                released
            }
            None => Vec::new(),
        }
    }

    /// Drop every parked action, returning how many were discarded
    pub(crate) fn purge_all(&self) -> usize {
        let purged: usize = self.queues.iter().map(|entry| entry.value().len()).sum();
        self.queues.clear();
        if purged > 0 {
            info!(purged = purged, "Purged all deferred actions");
        }
        purged
    }

    /// Number of actions parked on a specific prerequisite
    pub fn waiting_count(&self, prerequisite: &str) -> usize {
        self.queues
            .get(prerequisite)
            .map(|queue| queue.len())
            .unwrap_or(0)
    }

    /// Total number of parked actions across all prerequisites
    pub fn total_waiting(&self) -> usize {
        self.queues.iter().map(|entry| entry.value().len()).sum()
    }

    /// Prerequisite names that currently have parked actions
    pub fn prerequisites(&self) -> Vec<String> {
        self.queues.iter().map(|entry| entry.key().clone()).collect()
    }
}
