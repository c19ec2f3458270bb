//! Tauri Commands for Modules
//!
//! Exposes module CRUD and the atomic reorder to the frontend.

use sibling_order::OrderUpdate;
use tauri::State;
use crate::domain::{DomainError, Module};
use crate::repository::{ModulePositioningOperations, ModuleRepository, Repository};
use crate::AppState;

fn module_repo(state: &AppState) -> ModuleRepository {
    ModuleRepository::new(state.db_state.conn.clone(), state.config.reorder.batch_policy)
}

/// Modules of a course in position order
#[tauri::command]
pub async fn list_modules(state: State<'_, AppState>, course_id: u32) -> Result<Vec<Module>, DomainError> {
    module_repo(&state).list_by_course(course_id).await
}

/// Append a module at the end of its course
#[tauri::command]
pub async fn create_module(
    state: State<'_, AppState>,
    course_id: u32,
    title: String,
) -> Result<Module, DomainError> {
    module_repo(&state).create(&Module::new(0, course_id, title)).await
}

/// Delete a module and compact the rest of its course
#[tauri::command]
pub async fn delete_module(state: State<'_, AppState>, id: u32) -> Result<(), DomainError> {
    module_repo(&state).delete(id).await
}

/// Apply one reorder batch in a single transaction
#[tauri::command]
pub async fn persist_module_order(
    state: State<'_, AppState>,
    course_id: u32,
    updates: Vec<OrderUpdate>,
) -> Result<(), DomainError> {
    module_repo(&state).persist_order(course_id, &updates).await
}
