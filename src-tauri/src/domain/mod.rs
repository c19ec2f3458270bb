//! Domain Layer
//!
//! Contains all domain entities and core abstractions.

mod entity;
mod course;
mod module;
mod lesson;

pub use entity::{Entity, DomainError, DomainResult, require_title};
pub use course::Course;
pub use module::Module;
pub use lesson::Lesson;
