//! Lesson domain entity
//!
//! Nested content of a module, loaded when the module is expanded.

use serde::{Deserialize, Serialize};
use super::entity::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: u32,
    pub module_id: u32,
    pub title: String,
    pub position: i32,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Entity for Lesson {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Lesson {
    pub fn new(id: u32, module_id: u32, title: String) -> Self {
        Self {
            id,
            module_id,
            title,
            position: 0,
            created_at: None,
            updated_at: None,
        }
    }
}
