//! Reorder Errors
//!
//! Every failure the engine reports falls into one of three buckets, and all
//! of them are absorbed by the optimistic controller.

use serde::{Deserialize, Serialize};

/// Common result type for engine operations
pub type ReorderResult<T> = Result<T, ReorderError>;

/// Errors surfaced by the ordering engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReorderError {
    /// Unknown item or out-of-range index; nothing was mutated
    Validation(String),
    /// The request could not be sent or timed out
    Transport(String),
    /// The store aborted the atomic write
    TransactionRejected(String),
}

impl ReorderError {
    /// Only transport failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReorderError::Transport(_))
    }
}

impl std::fmt::Display for ReorderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReorderError::Validation(msg) => write!(f, "Invalid reorder: {}", msg),
            ReorderError::Transport(msg) => write!(f, "Could not reach the server: {}", msg),
            ReorderError::TransactionRejected(msg) => write!(f, "Reorder rejected: {}", msg),
        }
    }
}

impl std::error::Error for ReorderError {}
