//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
mod db;
mod course_repo;
mod lesson_repo;
mod module;

#[cfg(test)]
mod tests;

pub use traits::Repository;
pub use db::{init_db, DbState};
pub use course_repo::CourseRepository;
pub use lesson_repo::LessonRepository;
pub use module::{ModulePositioningOperations, ModuleRepository};
