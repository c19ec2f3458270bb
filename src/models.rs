//! Frontend Models
//!
//! Data structures matching backend entities.

use serde::{Deserialize, Serialize};
use sibling_order::{ItemId, ParentId, Sibling};

/// Course data structure (matches backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u32,
    pub title: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

/// Module data structure (matches backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: u32,
    pub course_id: u32,
    pub title: String,
    pub position: i32,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Sibling for Module {
    fn id(&self) -> ItemId {
        self.id
    }

    fn parent_id(&self) -> ParentId {
        self.course_id
    }

    fn order(&self) -> i32 {
        self.position
    }

    fn set_order(&mut self, order: i32) {
        self.position = order;
    }
}

/// Lesson data structure (matches backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: u32,
    pub module_id: u32,
    pub title: String,
    pub position: i32,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}
