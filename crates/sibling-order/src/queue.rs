//! Reorder Commit Queue
//!
//! Serializes commits per parent. While a commit is in flight, newer
//! sequences for the same parent overwrite a single pending slot; when the
//! in-flight commit succeeds, the pending sequence (if different) goes out
//! next. Parents never wait on each other.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use log::debug;

use crate::error::ReorderError;
use crate::gateway::{OrderPersistenceGateway, OrderStore};
use crate::item::{ParentId, Sibling};
use crate::model::OrderedCollection;

/// What became of one `enqueue` call
#[derive(Debug, Clone, PartialEq)]
pub enum QueueOutcome<T: Sibling> {
    /// Parked behind an in-flight commit; the caller that owns the flight
    /// reports the result
    Coalesced,
    /// This call drained the queue; `Ok` carries the sequence persisted last
    Settled(Result<OrderedCollection<T>, ReorderError>),
}

struct Slot<T: Sibling> {
    in_flight: bool,
    pending: Option<OrderedCollection<T>>,
}

impl<T: Sibling> Default for Slot<T> {
    fn default() -> Self {
        Self { in_flight: false, pending: None }
    }
}

pub struct ReorderCommitQueue<S: OrderStore> {
    gateway: OrderPersistenceGateway<S>,
    slots: RefCell<HashMap<ParentId, Slot<S::Item>>>,
    commits_issued: Cell<usize>,
}

impl<S: OrderStore> ReorderCommitQueue<S> {
    pub fn new(gateway: OrderPersistenceGateway<S>) -> Self {
        Self {
            gateway,
            slots: RefCell::new(HashMap::new()),
            commits_issued: Cell::new(0),
        }
    }

    pub fn gateway(&self) -> &OrderPersistenceGateway<S> {
        &self.gateway
    }

    pub fn is_in_flight(&self, parent_id: ParentId) -> bool {
        self.slots
            .borrow()
            .get(&parent_id)
            .map(|slot| slot.in_flight)
            .unwrap_or(false)
    }

    /// Gateway commits started so far, across all parents
    pub fn commits_issued(&self) -> usize {
        self.commits_issued.get()
    }

    /// Commit `sequence`, or park it behind the commit already in flight.
    pub async fn enqueue(&self, sequence: OrderedCollection<S::Item>) -> QueueOutcome<S::Item> {
        self.enqueue_with(sequence, |_| {}).await
    }

    /// Like `enqueue`; `on_persisted` sees every sequence the store accepted
    /// during this flight, including one followed by a failed commit.
    pub async fn enqueue_with(
        &self,
        sequence: OrderedCollection<S::Item>,
        on_persisted: impl Fn(&OrderedCollection<S::Item>),
    ) -> QueueOutcome<S::Item> {
        let parent_id = sequence.parent_id();
        {
            let mut slots = self.slots.borrow_mut();
            let slot = slots.entry(parent_id).or_default();
            if slot.in_flight {
                debug!("parent {} busy, replacing pending sequence", parent_id);
                slot.pending = Some(sequence);
                return QueueOutcome::Coalesced;
            }
            slot.in_flight = true;
        }

        let mut current = sequence;
        loop {
            self.commits_issued.set(self.commits_issued.get() + 1);
            let result = self.gateway.commit(&current).await;
            if result.is_ok() {
                on_persisted(&current);
            }

            let mut slots = self.slots.borrow_mut();
            let slot = slots.entry(parent_id).or_default();
            match result {
                Ok(()) => match slot.pending.take() {
                    Some(next) if !next.same_order(&current) => {
                        debug!("parent {} has a newer sequence, committing again", parent_id);
                        current = next;
                    }
                    _ => {
                        slot.in_flight = false;
                        return QueueOutcome::Settled(Ok(current));
                    }
                },
                Err(e) => {
                    if slot.pending.take().is_some() {
                        debug!("parent {} dropped its pending sequence after a failed commit", parent_id);
                    }
                    slot.in_flight = false;
                    return QueueOutcome::Settled(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use tokio::task::LocalSet;

    use super::*;
    use crate::config::ReorderConfig;
    use crate::item::OrderedItem;
    use crate::memory::MemoryOrderStore;

    fn seq(parent_id: ParentId) -> OrderedCollection<OrderedItem> {
        OrderedCollection::from_siblings(
            parent_id,
            (1..=4).map(|i| OrderedItem::new(parent_id * 10 + i, parent_id, i as i32)).collect(),
        )
    }

    fn queue(store: Rc<MemoryOrderStore>) -> Rc<ReorderCommitQueue<Rc<MemoryOrderStore>>> {
        let gateway = OrderPersistenceGateway::new(store, &ReorderConfig::default());
        Rc::new(ReorderCommitQueue::new(gateway))
    }

    #[tokio::test]
    async fn test_rapid_enqueues_coalesce_into_one_follow_up() {
        LocalSet::new()
            .run_until(async {
                let store = Rc::new(MemoryOrderStore::new());
                store.seed(seq(1).into_items());
                store.hold_commits();
                let q = queue(store.clone());

                let first = seq(1).moved(11, 3).unwrap();
                let second = first.moved(12, 0).unwrap();
                let third = second.moved(13, 1).unwrap();

                let flight = tokio::task::spawn_local({
                    let q = q.clone();
                    let first = first.clone();
                    async move { q.enqueue(first).await }
                });
                tokio::task::yield_now().await;
                assert!(q.is_in_flight(1));

                assert_eq!(q.enqueue(second).await, QueueOutcome::Coalesced);
                assert_eq!(q.enqueue(third.clone()).await, QueueOutcome::Coalesced);

                store.stop_holding();
                store.release_one();
                let outcome = flight.await.unwrap();

                assert_eq!(outcome, QueueOutcome::Settled(Ok(third.clone())));
                assert_eq!(store.persist_calls(), 2);
                assert_eq!(store.batches()[1].1, third.updates());
                assert_eq!(store.ordered_ids(1), third.ids());
                assert!(!q.is_in_flight(1));
            })
            .await;
    }

    #[tokio::test]
    async fn test_pending_equal_to_persisted_is_skipped() {
        LocalSet::new()
            .run_until(async {
                let store = Rc::new(MemoryOrderStore::new());
                store.seed(seq(1).into_items());
                store.hold_commits();
                let q = queue(store.clone());

                let target = seq(1).moved(14, 0).unwrap();
                let flight = tokio::task::spawn_local({
                    let q = q.clone();
                    let target = target.clone();
                    async move { q.enqueue(target).await }
                });
                tokio::task::yield_now().await;
                assert_eq!(q.enqueue(target.clone()).await, QueueOutcome::Coalesced);

                store.stop_holding();
                store.release_one();
                assert_eq!(flight.await.unwrap(), QueueOutcome::Settled(Ok(target)));
                assert_eq!(store.persist_calls(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn test_failure_drops_pending_sequence() {
        LocalSet::new()
            .run_until(async {
                let store = Rc::new(MemoryOrderStore::new());
                store.seed(seq(1).into_items());
                store.hold_commits();
                store.fail_next(ReorderError::TransactionRejected("sibling set changed".into()));
                let q = queue(store.clone());

                let first = seq(1).moved(12, 0).unwrap();
                let flight = tokio::task::spawn_local({
                    let q = q.clone();
                    async move { q.enqueue(first).await }
                });
                tokio::task::yield_now().await;
                q.enqueue(seq(1).moved(13, 0).unwrap()).await;

                store.stop_holding();
                store.release_one();
                match flight.await.unwrap() {
                    QueueOutcome::Settled(Err(ReorderError::TransactionRejected(_))) => {}
                    other => panic!("expected rejection, got {:?}", other),
                }
                // No automatic corrective attempt
                assert_eq!(store.persist_calls(), 1);
                assert_eq!(store.ordered_ids(1), vec![11, 12, 13, 14]);
            })
            .await;
    }

    #[tokio::test]
    async fn test_parents_commit_independently() {
        LocalSet::new()
            .run_until(async {
                let store = Rc::new(MemoryOrderStore::new());
                store.seed(seq(1).into_items());
                store.seed(seq(2).into_items());
                store.hold_commits();
                let q = queue(store.clone());

                let one = seq(1).moved(11, 3).unwrap();
                let two = seq(2).moved(21, 3).unwrap();
                let a = tokio::task::spawn_local({
                    let q = q.clone();
                    async move { q.enqueue(one).await }
                });
                let b = tokio::task::spawn_local({
                    let q = q.clone();
                    async move { q.enqueue(two).await }
                });
                tokio::task::yield_now().await;
                assert!(q.is_in_flight(1));
                assert!(q.is_in_flight(2));
                assert_eq!(store.persist_calls(), 2);

                store.stop_holding();
                store.release_one();
                store.release_one();
                assert!(matches!(a.await.unwrap(), QueueOutcome::Settled(Ok(_))));
                assert!(matches!(b.await.unwrap(), QueueOutcome::Settled(Ok(_))));
                assert_eq!(store.ordered_ids(2), vec![22, 23, 24, 21]);
            })
            .await;
    }

    #[tokio::test]
    async fn test_follow_up_failure_reports_earlier_success() {
        LocalSet::new()
            .run_until(async {
                let store = Rc::new(MemoryOrderStore::new());
                store.seed(seq(1).into_items());
                store.hold_commits();
                let q = queue(store.clone());

                let first = seq(1).moved(14, 0).unwrap();
                let second = first.moved(11, 3).unwrap();
                let accepted = Rc::new(RefCell::new(Vec::new()));

                let flight = tokio::task::spawn_local({
                    let q = q.clone();
                    let first = first.clone();
                    let accepted = accepted.clone();
                    async move {
                        q.enqueue_with(first, |persisted| accepted.borrow_mut().push(persisted.ids()))
                            .await
                    }
                });
                tokio::task::yield_now().await;
                assert_eq!(q.enqueue(second).await, QueueOutcome::Coalesced);

                // First commit goes through, the follow-up is waiting
                store.release_one();
                while store.persist_calls() < 2 {
                    tokio::task::yield_now().await;
                }
                store.fail_next(ReorderError::TransactionRejected("sibling set changed".into()));
                store.stop_holding();
                store.release_one();

                assert!(matches!(flight.await.unwrap(), QueueOutcome::Settled(Err(_))));
                assert_eq!(*accepted.borrow(), vec![first.ids()]);
                assert_eq!(store.ordered_ids(1), first.ids());
            })
            .await;
    }
}
