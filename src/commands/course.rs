//! Course Commands

use serde::Serialize;
use crate::models::Course;
use super::{call, CommandError, NoArgs};

#[derive(Serialize)]
struct CreateCourseArgs<'a> {
    title: &'a str,
}

pub async fn list_courses() -> Result<Vec<Course>, CommandError> {
    call("list_courses", &NoArgs {}).await
}

pub async fn create_course(title: &str) -> Result<Course, CommandError> {
    call("create_course", &CreateCourseArgs { title }).await
}
