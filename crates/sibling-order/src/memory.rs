//! In-Memory Order Store
//!
//! Reference `OrderStore` that behaves like a table with a unique index on
//! `(parent_id, order)`: every single-row write is checked, so batches have
//! to go through two-phase renumbering to succeed. Failures can be injected
//! and commits can be held open, which makes it the fixture for engine tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use log::debug;
use tokio::sync::Notify;

use crate::error::{ReorderError, ReorderResult};
use crate::gateway::OrderStore;
use crate::item::{ItemId, OrderUpdate, OrderedItem, ParentId};

#[derive(Default)]
pub struct MemoryOrderStore {
    rows: RefCell<HashMap<ItemId, OrderedItem>>,
    next_id: Cell<ItemId>,
    injected: RefCell<VecDeque<ReorderError>>,
    batches: RefCell<Vec<(ParentId, Vec<OrderUpdate>)>>,
    held: Cell<bool>,
    release: Notify,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows as-is, bypassing the ordering rules.
    pub fn seed(&self, items: Vec<OrderedItem>) {
        let mut rows = self.rows.borrow_mut();
        for item in items {
            self.next_id.set(self.next_id.get().max(item.id));
            rows.insert(item.id, item);
        }
    }

    /// Siblings sorted by order
    pub fn snapshot(&self, parent_id: ParentId) -> Vec<OrderedItem> {
        let mut items: Vec<OrderedItem> = self
            .rows
            .borrow()
            .values()
            .filter(|item| item.parent_id == parent_id)
            .copied()
            .collect();
        items.sort_by_key(|item| (item.order, item.id));
        items
    }

    pub fn ordered_ids(&self, parent_id: ParentId) -> Vec<ItemId> {
        self.snapshot(parent_id).iter().map(|item| item.id).collect()
    }

    /// Make the next `persist_order` call fail with `error`.
    pub fn fail_next(&self, error: ReorderError) {
        self.injected.borrow_mut().push_back(error);
    }

    /// Every batch received, including failed ones
    pub fn batches(&self) -> Vec<(ParentId, Vec<OrderUpdate>)> {
        self.batches.borrow().clone()
    }

    pub fn persist_calls(&self) -> usize {
        self.batches.borrow().len()
    }

    /// Keep subsequent `persist_order` calls pending until released.
    pub fn hold_commits(&self) {
        self.held.set(true);
    }

    /// Let one held commit proceed.
    pub fn release_one(&self) {
        self.release.notify_one();
    }

    /// Stop holding; already waiting commits still need `release_one`.
    pub fn stop_holding(&self) {
        self.held.set(false);
    }

    /// Two-phase renumbering against a working copy, swapped in on success.
    fn apply_batch(&self, parent_id: ParentId, updates: &[OrderUpdate]) -> ReorderResult<()> {
        let mut working = self.rows.borrow().clone();

        let mut ids = HashSet::new();
        let mut targets = HashSet::new();
        for update in updates {
            match working.get(&update.id) {
                Some(row) if row.parent_id == parent_id => {}
                _ => {
                    return Err(ReorderError::TransactionRejected(format!(
                        "item {} is not a child of {}",
                        update.id, parent_id
                    )))
                }
            }
            if !ids.insert(update.id) || !targets.insert(update.order) || update.order < 1 {
                return Err(ReorderError::TransactionRejected(format!(
                    "batch for parent {} repeats an id or order",
                    parent_id
                )));
            }
        }

        for update in updates {
            write_row(&mut working, update.id, -update.order)?;
        }
        for update in updates {
            write_row(&mut working, update.id, update.order)?;
        }

        let mut orders: Vec<i32> = working
            .values()
            .filter(|row| row.parent_id == parent_id)
            .map(|row| row.order)
            .collect();
        orders.sort_unstable();
        if orders.iter().enumerate().any(|(index, order)| *order != index as i32 + 1) {
            return Err(ReorderError::TransactionRejected(format!(
                "order under parent {} would not be dense",
                parent_id
            )));
        }

        *self.rows.borrow_mut() = working;
        Ok(())
    }
}

/// Single-row write with the unique `(parent_id, order)` check.
fn write_row(rows: &mut HashMap<ItemId, OrderedItem>, id: ItemId, order: i32) -> ReorderResult<()> {
    let parent_id = rows
        .get(&id)
        .map(|row| row.parent_id)
        .ok_or_else(|| ReorderError::TransactionRejected(format!("item {} vanished", id)))?;
    let taken = rows
        .values()
        .any(|row| row.id != id && row.parent_id == parent_id && row.order == order);
    if taken {
        return Err(ReorderError::TransactionRejected(format!(
            "order {} already taken under parent {}",
            order, parent_id
        )));
    }
    if let Some(row) = rows.get_mut(&id) {
        row.order = order;
    }
    Ok(())
}

#[async_trait(?Send)]
impl OrderStore for MemoryOrderStore {
    type Item = OrderedItem;
    type Draft = ();

    async fn list_siblings(&self, parent_id: ParentId) -> ReorderResult<Vec<OrderedItem>> {
        Ok(self.snapshot(parent_id))
    }

    async fn persist_order(&self, parent_id: ParentId, updates: &[OrderUpdate]) -> ReorderResult<()> {
        self.batches.borrow_mut().push((parent_id, updates.to_vec()));
        if self.held.get() {
            self.release.notified().await;
        }
        if let Some(error) = self.injected.borrow_mut().pop_front() {
            debug!("injected failure for parent {}: {}", parent_id, error);
            return Err(error);
        }
        self.apply_batch(parent_id, updates)
    }

    async fn create_sibling(&self, parent_id: ParentId, _draft: ()) -> ReorderResult<OrderedItem> {
        let order = self.snapshot(parent_id).len() as i32 + 1;
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let item = OrderedItem::new(id, parent_id, order);
        self.rows.borrow_mut().insert(id, item);
        Ok(item)
    }

    async fn delete_sibling(&self, parent_id: ParentId, id: ItemId) -> ReorderResult<()> {
        match self.rows.borrow().get(&id) {
            Some(row) if row.parent_id == parent_id => {}
            _ => return Err(ReorderError::Validation(format!("item {} is not a child of {}", id, parent_id))),
        }
        self.rows.borrow_mut().remove(&id);

        let compacted: Vec<OrderUpdate> = self
            .snapshot(parent_id)
            .iter()
            .enumerate()
            .map(|(index, item)| OrderUpdate::new(item.id, index as i32 + 1))
            .collect();
        self.apply_batch(parent_id, &compacted)
    }
}
