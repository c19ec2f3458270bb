//! Order Persistence Gateway
//!
//! Store boundary plus the component that turns a final sequence into one
//! `{id, order}` batch and hands it to the store as a single request.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use log::{info, warn};

use crate::config::{BatchPolicy, ReorderConfig};
use crate::error::{ReorderError, ReorderResult};
use crate::item::{ItemId, OrderUpdate, ParentId, Sibling};
use crate::model::OrderedCollection;

/// Persistence service the engine talks to.
///
/// `persist_order` must apply the whole batch atomically: either every pair
/// lands or none does.
#[async_trait(?Send)]
pub trait OrderStore {
    type Item: Sibling;
    /// Fields for a new sibling
    type Draft;

    /// All siblings under `parent_id`, in any order
    async fn list_siblings(&self, parent_id: ParentId) -> ReorderResult<Vec<Self::Item>>;

    async fn persist_order(&self, parent_id: ParentId, updates: &[OrderUpdate]) -> ReorderResult<()>;

    /// Append a new sibling at the tail
    async fn create_sibling(&self, parent_id: ParentId, draft: Self::Draft) -> ReorderResult<Self::Item>;

    /// Delete and compact the remaining siblings
    async fn delete_sibling(&self, parent_id: ParentId, id: ItemId) -> ReorderResult<()>;
}

#[async_trait(?Send)]
impl<S: OrderStore + ?Sized> OrderStore for Rc<S> {
    type Item = S::Item;
    type Draft = S::Draft;

    async fn list_siblings(&self, parent_id: ParentId) -> ReorderResult<Vec<Self::Item>> {
        (**self).list_siblings(parent_id).await
    }

    async fn persist_order(&self, parent_id: ParentId, updates: &[OrderUpdate]) -> ReorderResult<()> {
        (**self).persist_order(parent_id, updates).await
    }

    async fn create_sibling(&self, parent_id: ParentId, draft: Self::Draft) -> ReorderResult<Self::Item> {
        (**self).create_sibling(parent_id, draft).await
    }

    async fn delete_sibling(&self, parent_id: ParentId, id: ItemId) -> ReorderResult<()> {
        (**self).delete_sibling(parent_id, id).await
    }
}

/// Builds batches and commits them with bounded retry
pub struct OrderPersistenceGateway<S: OrderStore> {
    store: S,
    policy: BatchPolicy,
    max_attempts: u32,
    /// Last batch known to be persisted, per parent
    persisted: RefCell<HashMap<ParentId, Vec<OrderUpdate>>>,
}

impl<S: OrderStore> OrderPersistenceGateway<S> {
    pub fn new(store: S, config: &ReorderConfig) -> Self {
        Self {
            store,
            policy: config.batch_policy,
            max_attempts: config.max_commit_attempts.max(1),
            persisted: RefCell::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record what the store holds, e.g. after a fresh load.
    pub fn remember(&self, sequence: &OrderedCollection<S::Item>) {
        self.persisted
            .borrow_mut()
            .insert(sequence.parent_id(), sequence.updates());
    }

    /// Forget the persisted baseline, forcing the next batch to be full.
    pub fn forget(&self, parent_id: ParentId) {
        self.persisted.borrow_mut().remove(&parent_id);
    }

    /// Pairs to send for `sequence` under the configured policy.
    pub fn batch_for(&self, sequence: &OrderedCollection<S::Item>) -> Vec<OrderUpdate> {
        match self.policy {
            BatchPolicy::Full => sequence.updates(),
            BatchPolicy::ChangedOnly => match self.persisted.borrow().get(&sequence.parent_id()) {
                Some(previous) => sequence.changed_since(previous),
                None => sequence.updates(),
            },
        }
    }

    /// Persist `sequence` as one atomic batch.
    pub async fn commit(&self, sequence: &OrderedCollection<S::Item>) -> ReorderResult<()> {
        if !sequence.is_dense() {
            return Err(ReorderError::Validation(format!(
                "sequence under parent {} is not dense",
                sequence.parent_id()
            )));
        }

        let parent_id = sequence.parent_id();
        let batch = self.batch_for(sequence);
        if batch.is_empty() {
            info!("order under parent {} already persisted", parent_id);
            return Ok(());
        }

        let mut attempt = 1;
        loop {
            match self.store.persist_order(parent_id, &batch).await {
                Ok(()) => {
                    info!("persisted {} order pairs under parent {}", batch.len(), parent_id);
                    self.remember(sequence);
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    warn!("commit attempt {} under parent {} failed: {}", attempt, parent_id, e);
                    attempt += 1;
                }
                Err(e) => {
                    warn!("commit under parent {} failed: {}", parent_id, e);
                    // The store may hold anything now; next batch goes out in full
                    self.forget(parent_id);
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::OrderedItem;
    use crate::memory::MemoryOrderStore;

    fn abcd() -> OrderedCollection<OrderedItem> {
        OrderedCollection::from_siblings(1, (1..=4).map(|id| OrderedItem::new(id, 1, id as i32)).collect())
    }

    fn gateway(policy: BatchPolicy) -> OrderPersistenceGateway<Rc<MemoryOrderStore>> {
        let store = Rc::new(MemoryOrderStore::new());
        store.seed(abcd().into_items());
        let config = ReorderConfig { batch_policy: policy, ..ReorderConfig::default() };
        OrderPersistenceGateway::new(store, &config)
    }

    #[tokio::test]
    async fn test_scenario_batch_is_full_renumbering() {
        let gw = gateway(BatchPolicy::Full);
        let moved = abcd().moved(3, 0).unwrap();
        assert_eq!(
            gw.batch_for(&moved),
            vec![
                OrderUpdate::new(3, 1),
                OrderUpdate::new(1, 2),
                OrderUpdate::new(2, 3),
                OrderUpdate::new(4, 4),
            ]
        );
        gw.commit(&moved).await.unwrap();
        assert_eq!(gw.store().ordered_ids(1), vec![3, 1, 2, 4]);
    }

    #[tokio::test]
    async fn test_changed_only_sends_the_moved_span() {
        let gw = gateway(BatchPolicy::ChangedOnly);
        gw.remember(&abcd());
        let moved = abcd().moved(2, 2).unwrap();
        assert_eq!(gw.batch_for(&moved), vec![OrderUpdate::new(3, 2), OrderUpdate::new(2, 3)]);
        gw.commit(&moved).await.unwrap();
        assert_eq!(gw.store().ordered_ids(1), vec![1, 3, 2, 4]);
        assert_eq!(gw.store().persist_calls(), 1);

        // Nothing left to send
        gw.commit(&moved).await.unwrap();
        assert_eq!(gw.store().persist_calls(), 1);
    }

    #[tokio::test]
    async fn test_commit_is_idempotent() {
        let gw = gateway(BatchPolicy::Full);
        let moved = abcd().moved(1, 3).unwrap();
        gw.commit(&moved).await.unwrap();
        let first = gw.store().snapshot(1);
        gw.commit(&moved).await.unwrap();
        assert_eq!(gw.store().snapshot(1), first);
        assert_eq!(gw.store().persist_calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried_once() {
        let gw = gateway(BatchPolicy::Full);
        gw.store().fail_next(ReorderError::Transport("timeout".into()));
        gw.commit(&abcd().moved(4, 0).unwrap()).await.unwrap();
        assert_eq!(gw.store().persist_calls(), 2);
        assert_eq!(gw.store().ordered_ids(1), vec![4, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_rejections_are_not_retried() {
        let gw = gateway(BatchPolicy::Full);
        gw.store().fail_next(ReorderError::TransactionRejected("conflict".into()));
        let err = gw.commit(&abcd().moved(4, 0).unwrap()).await.unwrap_err();
        assert!(matches!(err, ReorderError::TransactionRejected(_)));
        assert_eq!(gw.store().persist_calls(), 1);
        assert_eq!(gw.store().ordered_ids(1), vec![1, 2, 3, 4]);
    }
}
