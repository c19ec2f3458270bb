//! Module Commands
//!
//! Frontend bindings for module CRUD and the atomic reorder.

use serde::Serialize;
use sibling_order::OrderUpdate;
use crate::models::Module;
use super::{call, CommandError, IdArgs};

#[derive(Serialize)]
struct CourseIdArgs {
    #[serde(rename = "courseId")]
    course_id: u32,
}

#[derive(Serialize)]
struct CreateModuleArgs<'a> {
    #[serde(rename = "courseId")]
    course_id: u32,
    title: &'a str,
}

#[derive(Serialize)]
struct PersistOrderArgs<'a> {
    #[serde(rename = "courseId")]
    course_id: u32,
    updates: &'a [OrderUpdate],
}

pub async fn list_modules(course_id: u32) -> Result<Vec<Module>, CommandError> {
    call("list_modules", &CourseIdArgs { course_id }).await
}

pub async fn create_module(course_id: u32, title: &str) -> Result<Module, CommandError> {
    call("create_module", &CreateModuleArgs { course_id, title }).await
}

pub async fn delete_module(id: u32) -> Result<(), CommandError> {
    call("delete_module", &IdArgs { id }).await
}

/// Send one `{id, order}` batch; the backend applies it in one transaction.
pub async fn persist_module_order(course_id: u32, updates: &[OrderUpdate]) -> Result<(), CommandError> {
    call("persist_module_order", &PersistOrderArgs { course_id, updates }).await
}
