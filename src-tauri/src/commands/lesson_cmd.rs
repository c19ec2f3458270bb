//! Tauri Commands for Lessons

use tauri::State;
use crate::domain::{DomainError, Lesson};
use crate::repository::{LessonRepository, Repository};
use crate::AppState;

#[tauri::command]
pub async fn list_lessons(state: State<'_, AppState>, module_id: u32) -> Result<Vec<Lesson>, DomainError> {
    LessonRepository::new(state.db_state.conn.clone()).list_by_module(module_id).await
}

#[tauri::command]
pub async fn create_lesson(
    state: State<'_, AppState>,
    module_id: u32,
    title: String,
) -> Result<Lesson, DomainError> {
    LessonRepository::new(state.db_state.conn.clone())
        .create(&Lesson::new(0, module_id, title))
        .await
}
