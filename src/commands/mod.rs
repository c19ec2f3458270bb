//! Tauri Command Wrappers
//!
//! Frontend bindings to backend commands, organized by domain.

mod course;
mod module;
mod lesson;
mod config;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sibling_order::ReorderError;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"], catch)]
    async fn invoke(cmd: &str, args: JsValue) -> Result<JsValue, JsValue>;
}

// Re-export all public items
pub use course::*;
pub use module::*;
pub use lesson::*;
pub use config::*;

/// Error value the backend rejects a command with (matches backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainError {
    NotFound(String),
    InvalidInput(String),
    Conflict(String),
    Internal(String),
}

/// Why a command call failed
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// The backend answered with an error
    Rejected(DomainError),
    /// The call never produced a usable answer
    Transport(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Rejected(DomainError::NotFound(msg)) => write!(f, "Not found: {}", msg),
            CommandError::Rejected(DomainError::InvalidInput(msg)) => write!(f, "Invalid input: {}", msg),
            CommandError::Rejected(DomainError::Conflict(msg)) => write!(f, "Conflict: {}", msg),
            CommandError::Rejected(DomainError::Internal(msg)) => write!(f, "Internal error: {}", msg),
            CommandError::Transport(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<CommandError> for ReorderError {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::Rejected(DomainError::NotFound(msg) | DomainError::InvalidInput(msg)) => {
                ReorderError::Validation(msg)
            }
            CommandError::Rejected(DomainError::Conflict(msg) | DomainError::Internal(msg)) => {
                ReorderError::TransactionRejected(msg)
            }
            CommandError::Transport(msg) => ReorderError::Transport(msg),
        }
    }
}

/// Invoke `cmd` and decode its answer.
async fn call<A: Serialize, T: DeserializeOwned>(cmd: &str, args: &A) -> Result<T, CommandError> {
    let js_args = serde_wasm_bindgen::to_value(args).map_err(|e| CommandError::Transport(e.to_string()))?;
    match invoke(cmd, js_args).await {
        Ok(value) => serde_wasm_bindgen::from_value(value)
            .map_err(|e| CommandError::Transport(format!("{}: bad response: {}", cmd, e))),
        Err(err) => match serde_wasm_bindgen::from_value::<DomainError>(err.clone()) {
            Ok(domain) => Err(CommandError::Rejected(domain)),
            Err(_) => Err(CommandError::Transport(
                err.as_string().unwrap_or_else(|| format!("{} failed: {:?}", cmd, err)),
            )),
        },
    }
}

#[derive(Serialize)]
struct NoArgs {}

#[derive(Serialize)]
struct IdArgs {
    id: u32,
}
