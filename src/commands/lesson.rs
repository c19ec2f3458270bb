//! Lesson Commands

use serde::Serialize;
use crate::models::Lesson;
use super::{call, CommandError};

#[derive(Serialize)]
struct ModuleIdArgs {
    #[serde(rename = "moduleId")]
    module_id: u32,
}

#[derive(Serialize)]
struct CreateLessonArgs<'a> {
    #[serde(rename = "moduleId")]
    module_id: u32,
    title: &'a str,
}

pub async fn list_lessons(module_id: u32) -> Result<Vec<Lesson>, CommandError> {
    call("list_lessons", &ModuleIdArgs { module_id }).await
}

pub async fn create_lesson(module_id: u32, title: &str) -> Result<Lesson, CommandError> {
    call("create_lesson", &CreateLessonArgs { module_id, title }).await
}
