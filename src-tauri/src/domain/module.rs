//! Module Entity
//!
//! A unit of a course. Modules are the siblings being reordered: `position`
//! is the 1-based dense order within `course_id`.

use serde::{Deserialize, Serialize};
use sibling_order::{ItemId, ParentId, Sibling};
use super::entity::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Unique identifier
    pub id: u32,
    /// Owning course
    pub course_id: u32,
    pub title: String,
    /// Position among the course's modules, 1..N
    pub position: i32,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Entity for Module {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Module {
    pub fn new(id: u32, course_id: u32, title: String) -> Self {
        Self {
            id,
            course_id,
            title,
            position: 0,
            created_at: None,
            updated_at: None,
        }
    }
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
