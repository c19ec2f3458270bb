//! Ordered Collection
//!
//! In-memory sibling sequence for one parent. Every operation returns a new
//! collection and renumbers all items to `order = index + 1`, so a collection
//! built through this API is always dense.

use log::warn;

use crate::error::{ReorderError, ReorderResult};
use crate::item::{ItemId, OrderUpdate, ParentId, Sibling};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderedCollection<T: Sibling> {
    parent_id: ParentId,
    items: Vec<T>,
}

impl<T: Sibling> OrderedCollection<T> {
    pub fn empty(parent_id: ParentId) -> Self {
        Self { parent_id, items: Vec::new() }
    }

    /// Build from loaded siblings.
    ///
    /// Items are sorted by `(order, id)`; gaps or duplicates coming from the
    /// store are repaired by renumbering.
    pub fn from_siblings(parent_id: ParentId, mut items: Vec<T>) -> Self {
        items.retain(|item| {
            let ours = item.parent_id() == parent_id;
            if !ours {
                warn!("dropping item {} loaded under parent {} but owned by {}", item.id(), parent_id, item.parent_id());
            }
            ours
        });
        items.sort_by_key(|item| (item.order(), item.id()));

        let mut collection = Self { parent_id, items };
        if !collection.is_dense() {
            warn!("repairing non-dense order under parent {}", parent_id);
            collection.renumber();
        }
        collection
    }

    pub fn parent_id(&self) -> ParentId {
        self.parent_id
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(Sibling::id).collect()
    }

    pub fn position_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn get(&self, id: ItemId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Move `id` to `target_index` (clamped to `[0, N-1]`) and renumber.
    pub fn moved(&self, id: ItemId, target_index: usize) -> ReorderResult<Self> {
        let from = self.position_of(id).ok_or_else(|| {
            ReorderError::Validation(format!("item {} is not a child of {}", id, self.parent_id))
        })?;

        let mut items = self.items.clone();
        let item = items.remove(from);
        let to = target_index.min(items.len());
        items.insert(to, item);

        let mut next = Self { parent_id: self.parent_id, items };
        next.renumber();
        Ok(next)
    }

    /// Append at the tail with `order = N + 1`.
    pub fn appended(&self, item: T) -> ReorderResult<Self> {
        if item.parent_id() != self.parent_id {
            return Err(ReorderError::Validation(format!(
                "item {} belongs to parent {}, not {}",
                item.id(),
                item.parent_id(),
                self.parent_id
            )));
        }
        if self.position_of(item.id()).is_some() {
            return Err(ReorderError::Validation(format!("item {} already present", item.id())));
        }

        let expected = self.items.len() as i32 + 1;
        if item.order() != expected {
            warn!("item {} arrived with order {}, placing it at {}", item.id(), item.order(), expected);
        }

        let mut items = self.items.clone();
        items.push(item);
        let mut next = Self { parent_id: self.parent_id, items };
        next.renumber();
        Ok(next)
    }

    /// Remove `id` and compact the remaining siblings.
    pub fn removed(&self, id: ItemId) -> ReorderResult<Self> {
        let at = self.position_of(id).ok_or_else(|| {
            ReorderError::Validation(format!("item {} is not a child of {}", id, self.parent_id))
        })?;

        let mut items = self.items.clone();
        items.remove(at);
        let mut next = Self { parent_id: self.parent_id, items };
        next.renumber();
        Ok(next)
    }

    /// This set of siblings arranged the way `persisted` orders them.
    ///
    /// Siblings `persisted` does not know (created since) keep their
    /// relative order at the tail; ids only `persisted` has (deleted since)
    /// are dropped.
    pub fn with_order_of(&self, persisted: &Self) -> Self {
        let mut items: Vec<T> = persisted
            .items
            .iter()
            .filter_map(|item| self.get(item.id()).cloned())
            .collect();
        items.extend(
            self.items
                .iter()
                .filter(|item| persisted.position_of(item.id()).is_none())
                .cloned(),
        );
        let mut next = Self { parent_id: self.parent_id, items };
        next.renumber();
        next
    }

    /// Full `{id, order}` batch for this sequence.
    pub fn updates(&self) -> Vec<OrderUpdate> {
        self.items
            .iter()
            .map(|item| OrderUpdate::new(item.id(), item.order()))
            .collect()
    }

    /// Pairs whose order differs from `previous`, plus any pair `previous`
    /// does not know about.
    pub fn changed_since(&self, previous: &[OrderUpdate]) -> Vec<OrderUpdate> {
        self.updates()
            .into_iter()
            .filter(|update| !previous.contains(update))
            .collect()
    }

    /// True when the orders are exactly `1..=N` in sequence.
    pub fn is_dense(&self) -> bool {
        self.items
            .iter()
            .enumerate()
            .all(|(index, item)| item.order() == index as i32 + 1)
    }

    /// Same ids in the same positions.
    pub fn same_order(&self, other: &Self) -> bool {
        self.parent_id == other.parent_id
            && self.items.len() == other.items.len()
            && self.items.iter().zip(&other.items).all(|(a, b)| a.id() == b.id())
    }

    fn renumber(&mut self) {
        for (index, item) in self.items.iter_mut().enumerate() {
            item.set_order(index as i32 + 1);
        }
    }
}
