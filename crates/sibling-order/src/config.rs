//! Reorder Configuration
//!
//! Tunables shared by the gesture controller, the gateway and the UI.
//! Every field has a default so a partial config section deserializes.

use serde::{Deserialize, Serialize};

/// Which pairs a commit sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Every sibling with its new order
    #[default]
    Full,
    /// Only siblings whose order differs from the last persisted sequence
    ChangedOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorderConfig {
    /// Pointer travel in pixels before a press becomes a drag
    pub activation_distance_px: f64,
    pub batch_policy: BatchPolicy,
    /// Attempts per commit, including the first
    pub max_commit_attempts: u32,
    /// Per-request timeout applied by the transport
    pub commit_timeout_ms: u32,
    /// Delay before re-fetching siblings after a confirmed reorder
    pub refetch_delay_ms: Option<u32>,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            activation_distance_px: 5.0,
            batch_policy: BatchPolicy::Full,
            max_commit_attempts: 2,
            commit_timeout_ms: 8_000,
            refetch_delay_ms: Some(1_000),
        }
    }
}
