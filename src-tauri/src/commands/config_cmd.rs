//! Reorder settings for the frontend engine

use sibling_order::ReorderConfig;
use tauri::State;
use crate::AppState;

#[tauri::command]
pub fn get_reorder_config(state: State<'_, AppState>) -> ReorderConfig {
    state.config.reorder.clone()
}
