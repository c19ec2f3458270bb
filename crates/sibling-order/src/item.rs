//! Ordered Items
//!
//! The minimal shape the engine needs from a sibling record.

use serde::{Deserialize, Serialize};

/// Identifier of an ordered record
pub type ItemId = u32;

/// Identifier of the parent that owns a sibling set
pub type ParentId = u32;

/// Anything that can take part in a sibling ordering
pub trait Sibling: Clone {
    fn id(&self) -> ItemId;
    fn parent_id(&self) -> ParentId;
    /// 1-based position among siblings
    fn order(&self) -> i32;
    fn set_order(&mut self, order: i32);
}

/// Bare ordered record, used where no payload is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedItem {
    pub id: ItemId,
    pub parent_id: ParentId,
    pub order: i32,
}

impl OrderedItem {
    pub fn new(id: ItemId, parent_id: ParentId, order: i32) -> Self {
        Self { id, parent_id, order }
    }
}

impl Sibling for OrderedItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn parent_id(&self) -> ParentId {
        self.parent_id
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

/// One `{id, order}` pair of a persistence batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub id: ItemId,
    pub order: i32,
}

impl OrderUpdate {
    pub fn new(id: ItemId, order: i32) -> Self {
        Self { id, order }
    }
}
