//! Course domain entity

use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// A course owns an ordered list of modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u32,
    pub title: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Entity for Course {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Course {
    pub fn new(id: u32, title: String) -> Self {
        Self { id, title, created_at: None, updated_at: None }
    }
}
