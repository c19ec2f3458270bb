//! Commands Layer
//!
//! Tauri command handlers that bridge frontend to backend services.
//! Errors cross IPC as serialized `DomainError` values.

mod course_cmd;
mod module_cmd;
mod lesson_cmd;
mod config_cmd;

pub use course_cmd::*;
pub use module_cmd::*;
pub use lesson_cmd::*;
pub use config_cmd::*;
