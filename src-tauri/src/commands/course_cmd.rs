//! Tauri Commands for Courses

use tauri::State;
use crate::domain::{Course, DomainError};
use crate::repository::{CourseRepository, Repository};
use crate::AppState;

#[tauri::command]
pub async fn list_courses(state: State<'_, AppState>) -> Result<Vec<Course>, DomainError> {
    let repo = CourseRepository::new(state.db_state.conn.clone());
    repo.list().await
}

#[tauri::command]
pub async fn create_course(state: State<'_, AppState>, title: String) -> Result<Course, DomainError> {
    let repo = CourseRepository::new(state.db_state.conn.clone());
    repo.create(&Course::new(0, title)).await
}
