//! Optimistic Update Controller
//!
//! Owns the sibling sequence of one parent during an editing session as an
//! explicit three-state value:
//! - `confirmed`: last sequence the store acknowledged
//! - `optimistic`: sequence shown while commits are outstanding
//! - `status`: idle, pending, or the last failure
//!
//! What observers see is always one of: the confirmed sequence, an
//! optimistic sequence produced by `moved`, or a newly confirmed sequence.

use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};

use crate::error::{ReorderError, ReorderResult};
use crate::gateway::OrderStore;
use crate::item::{ItemId, ParentId, Sibling};
use crate::model::OrderedCollection;
use crate::queue::{QueueOutcome, ReorderCommitQueue};

/// Commit state shown next to the list
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CommitStatus {
    #[default]
    Idle,
    Pending,
    Failed(ReorderError),
}

/// Result of `perform_move`
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Rejected before anything changed
    Rejected(ReorderError),
    /// The item already sits at that index
    Unchanged,
    /// Shown optimistically; an earlier move owns the commit that will carry it
    Coalesced,
    /// The store confirmed the sequence
    Confirmed,
    /// The commit failed and the sequence reverted to the last confirmed one
    RolledBack(ReorderError),
}

type Observer<T> = Box<dyn Fn(&OrderedCollection<T>, &CommitStatus)>;

struct OrderState<T: Sibling> {
    confirmed: OrderedCollection<T>,
    optimistic: Option<OrderedCollection<T>>,
    status: CommitStatus,
}

impl<T: Sibling> OrderState<T> {
    fn rendered(&self) -> &OrderedCollection<T> {
        self.optimistic.as_ref().unwrap_or(&self.confirmed)
    }
}

pub struct OptimisticUpdateController<S: OrderStore> {
    parent_id: ParentId,
    queue: Rc<ReorderCommitQueue<S>>,
    state: RefCell<OrderState<S::Item>>,
    observers: RefCell<Vec<Observer<S::Item>>>,
}

impl<S: OrderStore> OptimisticUpdateController<S> {
    /// Start from an already loaded sequence.
    pub fn new(queue: Rc<ReorderCommitQueue<S>>, initial: OrderedCollection<S::Item>) -> Self {
        queue.gateway().remember(&initial);
        Self {
            parent_id: initial.parent_id(),
            queue,
            state: RefCell::new(OrderState {
                confirmed: initial,
                optimistic: None,
                status: CommitStatus::Idle,
            }),
            observers: RefCell::new(Vec::new()),
        }
    }

    /// Load the siblings of `parent_id` from the store.
    pub async fn load(queue: Rc<ReorderCommitQueue<S>>, parent_id: ParentId) -> ReorderResult<Self> {
        let items = queue.gateway().store().list_siblings(parent_id).await?;
        Ok(Self::new(queue, OrderedCollection::from_siblings(parent_id, items)))
    }

    pub fn parent_id(&self) -> ParentId {
        self.parent_id
    }

    /// Sequence to render right now
    pub fn rendered(&self) -> OrderedCollection<S::Item> {
        self.state.borrow().rendered().clone()
    }

    pub fn confirmed(&self) -> OrderedCollection<S::Item> {
        self.state.borrow().confirmed.clone()
    }

    pub fn status(&self) -> CommitStatus {
        self.state.borrow().status.clone()
    }

    /// Call `observer` on every change of the rendered sequence or status.
    pub fn subscribe(&self, observer: impl Fn(&OrderedCollection<S::Item>, &CommitStatus) + 'static) {
        self.observers.borrow_mut().push(Box::new(observer));
    }

    pub fn dismiss_error(&self) {
        let changed = {
            let mut state = self.state.borrow_mut();
            if matches!(state.status, CommitStatus::Failed(_)) {
                state.status = CommitStatus::Idle;
                true
            } else {
                false
            }
        };
        if changed {
            self.notify();
        }
    }

    /// Move `item_id` to `target_index`, show it, and persist it.
    pub async fn perform_move(&self, item_id: ItemId, target_index: usize) -> MoveOutcome {
        let next = {
            let state = self.state.borrow();
            let current = state.rendered();
            if target_index >= current.len() {
                return MoveOutcome::Rejected(ReorderError::Validation(format!(
                    "index {} out of range for {} items",
                    target_index,
                    current.len()
                )));
            }
            match current.moved(item_id, target_index) {
                Ok(next) if next.same_order(current) => return MoveOutcome::Unchanged,
                Ok(next) => next,
                Err(e) => return MoveOutcome::Rejected(e),
            }
        };
        self.apply_sequence(next).await
    }

    /// Show and persist a sequence computed elsewhere, e.g. a finished drag.
    pub async fn apply_sequence(&self, next: OrderedCollection<S::Item>) -> MoveOutcome {
        match self.stage_sequence(next) {
            Ok(staged) => self.commit_staged(staged).await,
            Err(outcome) => outcome,
        }
    }

    /// Validate `next` and put it on screen without touching the store.
    ///
    /// The returned sequence goes to `commit_staged`; `Err` carries the
    /// outcome when there is nothing to commit.
    pub fn stage_sequence(
        &self,
        next: OrderedCollection<S::Item>,
    ) -> Result<OrderedCollection<S::Item>, MoveOutcome> {
        {
            let mut state = self.state.borrow_mut();
            if next.parent_id() != self.parent_id || !next.is_dense() {
                return Err(MoveOutcome::Rejected(ReorderError::Validation(format!(
                    "sequence is not a dense ordering of parent {}",
                    self.parent_id
                ))));
            }
            let mut expected = state.rendered().ids();
            let mut proposed = next.ids();
            expected.sort_unstable();
            proposed.sort_unstable();
            if expected != proposed {
                return Err(MoveOutcome::Rejected(ReorderError::Validation(format!(
                    "sequence does not contain the siblings of parent {}",
                    self.parent_id
                ))));
            }
            if next.same_order(state.rendered()) {
                return Err(MoveOutcome::Unchanged);
            }
            state.optimistic = Some(next.clone());
            state.status = CommitStatus::Pending;
        }
        self.notify();
        Ok(next)
    }

    /// Persist a sequence shown by `stage_sequence`.
    pub async fn commit_staged(&self, staged: OrderedCollection<S::Item>) -> MoveOutcome {
        let outcome = self
            .queue
            .enqueue_with(staged, |persisted| self.absorb_persisted(persisted))
            .await;

        match outcome {
            QueueOutcome::Coalesced => MoveOutcome::Coalesced,
            QueueOutcome::Settled(Ok(_)) => {
                {
                    // The queue drained: confirmed already holds everything
                    let mut state = self.state.borrow_mut();
                    if let Some(shown) = state.optimistic.take() {
                        if !shown.same_order(&state.confirmed) {
                            warn!("shown order under parent {} differs from the persisted one", self.parent_id);
                        }
                    }
                    state.status = CommitStatus::Idle;
                }
                info!("order under parent {} confirmed", self.parent_id);
                self.notify();
                MoveOutcome::Confirmed
            }
            QueueOutcome::Settled(Err(e)) => {
                {
                    let mut state = self.state.borrow_mut();
                    state.optimistic = None;
                    state.status = CommitStatus::Failed(e.clone());
                }
                warn!("order under parent {} rolled back: {}", self.parent_id, e);
                self.notify();
                MoveOutcome::RolledBack(e)
            }
        }
    }

    /// The store accepted `persisted`; siblings created or deleted while it
    /// was in flight stay as they are.
    fn absorb_persisted(&self, persisted: &OrderedCollection<S::Item>) {
        let confirmed = {
            let mut state = self.state.borrow_mut();
            state.confirmed = state.confirmed.with_order_of(persisted);
            state.confirmed.clone()
        };
        self.queue.gateway().remember(&confirmed);
    }

    /// Re-read the siblings from the store to absorb changes made elsewhere.
    ///
    /// Skipped while a commit for this parent is in flight or optimistic
    /// state is on screen.
    pub async fn refresh(&self) -> ReorderResult<bool> {
        if self.is_busy() {
            return Ok(false);
        }
        let items = self.queue.gateway().store().list_siblings(self.parent_id).await?;
        if self.is_busy() {
            return Ok(false);
        }
        let fresh = OrderedCollection::from_siblings(self.parent_id, items);
        self.queue.gateway().remember(&fresh);
        self.state.borrow_mut().confirmed = fresh;
        self.notify();
        Ok(true)
    }

    /// Create a sibling at the tail.
    pub async fn create(&self, draft: S::Draft) -> ReorderResult<S::Item> {
        let created = self
            .queue
            .gateway()
            .store()
            .create_sibling(self.parent_id, draft)
            .await
            .map_err(|e| self.record_failure(e))?;
        {
            let mut state = self.state.borrow_mut();
            state.confirmed = state.confirmed.appended(created.clone())?;
            if let Some(shown) = state.optimistic.take() {
                state.optimistic = Some(shown.appended(created.clone())?);
            }
        }
        self.sync_baseline();
        self.notify();
        Ok(created)
    }

    /// Delete a sibling; the remaining ones are compacted.
    pub async fn delete(&self, item_id: ItemId) -> ReorderResult<()> {
        if self.state.borrow().rendered().position_of(item_id).is_none() {
            return Err(ReorderError::Validation(format!(
                "item {} is not a child of {}",
                item_id, self.parent_id
            )));
        }
        self.queue
            .gateway()
            .store()
            .delete_sibling(self.parent_id, item_id)
            .await
            .map_err(|e| self.record_failure(e))?;
        {
            let mut state = self.state.borrow_mut();
            if state.confirmed.position_of(item_id).is_some() {
                state.confirmed = state.confirmed.removed(item_id)?;
            }
            if let Some(shown) = state.optimistic.take() {
                state.optimistic = Some(shown.removed(item_id)?);
            }
        }
        self.sync_baseline();
        self.notify();
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.queue.is_in_flight(self.parent_id) || self.state.borrow().optimistic.is_some()
    }

    /// After structural changes the store renumbered on its own.
    fn sync_baseline(&self) {
        let confirmed = self.state.borrow().confirmed.clone();
        self.queue.gateway().remember(&confirmed);
    }

    fn record_failure(&self, error: ReorderError) -> ReorderError {
        self.state.borrow_mut().status = CommitStatus::Failed(error.clone());
        self.notify();
        error
    }

    fn notify(&self) {
        let state = self.state.borrow();
        for observer in self.observers.borrow().iter() {
            observer(state.rendered(), &state.status);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use tokio::task::LocalSet;

    use super::*;
    use crate::config::ReorderConfig;
    use crate::gateway::OrderPersistenceGateway;
    use crate::item::{OrderUpdate, OrderedItem};
    use crate::memory::MemoryOrderStore;

    const A: ItemId = 1;
    const B: ItemId = 2;
    const C: ItemId = 3;
    const D: ItemId = 4;

    type Controller = OptimisticUpdateController<Rc<MemoryOrderStore>>;

    async fn setup() -> (Rc<MemoryOrderStore>, Rc<Controller>) {
        let store = Rc::new(MemoryOrderStore::new());
        store.seed((A..=D).map(|id| OrderedItem::new(id, 7, id as i32)).collect());
        let gateway = OrderPersistenceGateway::new(store.clone(), &ReorderConfig::default());
        let queue = Rc::new(ReorderCommitQueue::new(gateway));
        let controller = Controller::load(queue, 7).await.unwrap();
        (store, Rc::new(controller))
    }

    #[tokio::test]
    async fn test_move_is_confirmed_and_persisted() {
        let (store, ctl) = setup().await;
        assert_eq!(ctl.perform_move(C, 0).await, MoveOutcome::Confirmed);
        assert_eq!(ctl.rendered().ids(), vec![C, A, B, D]);
        assert_eq!(ctl.confirmed().ids(), vec![C, A, B, D]);
        assert_eq!(store.ordered_ids(7), vec![C, A, B, D]);
        assert_eq!(ctl.status(), CommitStatus::Idle);
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back_exactly() {
        LocalSet::new()
            .run_until(async {
                let (store, ctl) = setup().await;
                store.hold_commits();
                store.fail_next(ReorderError::Transport("offline".into()));
                store.fail_next(ReorderError::Transport("offline".into()));

                let seen = Rc::new(RefCell::new(Vec::new()));
                ctl.subscribe({
                    let seen = seen.clone();
                    move |sequence, status| seen.borrow_mut().push((sequence.ids(), status.clone()))
                });

                let flight = tokio::task::spawn_local({
                    let ctl = ctl.clone();
                    async move { ctl.perform_move(C, 0).await }
                });
                tokio::task::yield_now().await;
                assert_eq!(ctl.rendered().ids(), vec![C, A, B, D]);
                assert_eq!(ctl.status(), CommitStatus::Pending);

                store.stop_holding();
                store.release_one();
                let outcome = flight.await.unwrap();
                assert!(matches!(outcome, MoveOutcome::RolledBack(ReorderError::Transport(_))));

                assert_eq!(ctl.rendered().ids(), vec![A, B, C, D]);
                assert!(ctl.rendered().is_dense());
                assert!(matches!(ctl.status(), CommitStatus::Failed(_)));
                assert_eq!(store.ordered_ids(7), vec![A, B, C, D]);

                // Observers only ever saw whole sequences
                let seen = seen.borrow();
                assert_eq!(seen[0], (vec![C, A, B, D], CommitStatus::Pending));
                assert_eq!(seen.last().unwrap().0, vec![A, B, C, D]);
                drop(seen);

                ctl.dismiss_error();
                assert_eq!(ctl.status(), CommitStatus::Idle);
            })
            .await;
    }

    #[tokio::test]
    async fn test_three_rapid_moves_cost_one_extra_commit() {
        LocalSet::new()
            .run_until(async {
                let (store, ctl) = setup().await;
                store.hold_commits();

                let first = tokio::task::spawn_local({
                    let ctl = ctl.clone();
                    async move { ctl.perform_move(D, 0).await }
                });
                tokio::task::yield_now().await;
                assert_eq!(ctl.perform_move(A, 3).await, MoveOutcome::Coalesced);
                assert_eq!(ctl.perform_move(B, 0).await, MoveOutcome::Coalesced);
                let latest = ctl.rendered();
                assert_eq!(latest.ids(), vec![B, D, C, A]);

                store.stop_holding();
                store.release_one();
                assert_eq!(first.await.unwrap(), MoveOutcome::Confirmed);

                assert_eq!(store.persist_calls(), 2);
                assert_eq!(store.batches()[1].1, latest.updates());
                assert_eq!(ctl.rendered().ids(), vec![B, D, C, A]);
                assert_eq!(store.ordered_ids(7), vec![B, D, C, A]);
            })
            .await;
    }

    #[tokio::test]
    async fn test_validation_errors_change_nothing() {
        let (store, ctl) = setup().await;
        assert!(matches!(ctl.perform_move(99, 0).await, MoveOutcome::Rejected(ReorderError::Validation(_))));
        assert!(matches!(ctl.perform_move(A, 4).await, MoveOutcome::Rejected(ReorderError::Validation(_))));
        assert_eq!(ctl.perform_move(B, 1).await, MoveOutcome::Unchanged);
        assert_eq!(ctl.rendered().ids(), vec![A, B, C, D]);
        assert_eq!(store.persist_calls(), 0);
    }

    #[tokio::test]
    async fn test_create_and_delete_keep_density() {
        let (store, ctl) = setup().await;
        let created = ctl.create(()).await.unwrap();
        assert_eq!(created.order, 5);
        assert_eq!(ctl.rendered().ids(), vec![A, B, C, D, created.id]);

        ctl.delete(B).await.unwrap();
        let rendered = ctl.rendered();
        assert_eq!(rendered.ids(), vec![A, C, D, created.id]);
        assert!(rendered.is_dense());
        assert_eq!(store.ordered_ids(7), rendered.ids());
    }

    #[tokio::test]
    async fn test_refresh_absorbs_out_of_band_changes() {
        let (store, ctl) = setup().await;
        // Another session reordered the same course
        store
            .persist_order(7, &[OrderUpdate::new(A, 4), OrderUpdate::new(D, 1), OrderUpdate::new(B, 2), OrderUpdate::new(C, 3)])
            .await
            .unwrap();
        assert!(ctl.refresh().await.unwrap());
        assert_eq!(ctl.rendered().ids(), vec![D, B, C, A]);
    }

    #[tokio::test]
    async fn test_staged_sequence_is_shown_before_any_commit() {
        let (store, ctl) = setup().await;
        let next = ctl.rendered().moved(C, 0).unwrap();

        let staged = ctl.stage_sequence(next).unwrap();
        assert_eq!(ctl.rendered().ids(), vec![C, A, B, D]);
        assert_eq!(ctl.status(), CommitStatus::Pending);
        assert_eq!(store.persist_calls(), 0);

        assert_eq!(ctl.commit_staged(staged).await, MoveOutcome::Confirmed);
        assert_eq!(store.ordered_ids(7), vec![C, A, B, D]);
        assert_eq!(ctl.stage_sequence(ctl.rendered()), Err(MoveOutcome::Unchanged));
    }

    #[tokio::test]
    async fn test_failed_follow_up_keeps_the_accepted_commit() {
        LocalSet::new()
            .run_until(async {
                let (store, ctl) = setup().await;
                store.hold_commits();

                let flight = tokio::task::spawn_local({
                    let ctl = ctl.clone();
                    async move { ctl.perform_move(D, 0).await }
                });
                tokio::task::yield_now().await;
                assert_eq!(ctl.perform_move(A, 3).await, MoveOutcome::Coalesced);

                store.release_one();
                while store.persist_calls() < 2 {
                    tokio::task::yield_now().await;
                }
                assert_eq!(store.ordered_ids(7), vec![D, A, B, C]);
                store.fail_next(ReorderError::TransactionRejected("sibling set changed".into()));
                store.stop_holding();
                store.release_one();

                let outcome = flight.await.unwrap();
                assert!(matches!(outcome, MoveOutcome::RolledBack(ReorderError::TransactionRejected(_))));
                assert_eq!(ctl.rendered().ids(), vec![D, A, B, C]);
                assert_eq!(ctl.confirmed().ids(), store.ordered_ids(7));
            })
            .await;
    }

    #[tokio::test]
    async fn test_create_during_commit_survives_confirmation() {
        LocalSet::new()
            .run_until(async {
                let (store, ctl) = setup().await;
                store.hold_commits();

                let flight = tokio::task::spawn_local({
                    let ctl = ctl.clone();
                    async move { ctl.perform_move(D, 0).await }
                });
                tokio::task::yield_now().await;
                let created = ctl.create(()).await.unwrap();
                assert_eq!(ctl.rendered().ids(), vec![D, A, B, C, created.id]);

                store.stop_holding();
                store.release_one();
                assert_eq!(flight.await.unwrap(), MoveOutcome::Confirmed);

                let expected = vec![D, A, B, C, created.id];
                assert_eq!(ctl.confirmed().ids(), expected);
                assert_eq!(ctl.rendered().ids(), expected);
                assert_eq!(store.ordered_ids(7), expected);
                assert!(ctl.confirmed().is_dense());

                // Nothing left on screen that blocks a refetch
                assert!(ctl.refresh().await.unwrap());
                assert_eq!(ctl.rendered().ids(), expected);
            })
            .await;
    }

    #[tokio::test]
    async fn test_delete_during_commit_matches_store_after_rejection() {
        LocalSet::new()
            .run_until(async {
                let (store, ctl) = setup().await;
                store.hold_commits();

                let flight = tokio::task::spawn_local({
                    let ctl = ctl.clone();
                    async move { ctl.perform_move(D, 0).await }
                });
                tokio::task::yield_now().await;
                ctl.delete(B).await.unwrap();
                assert_eq!(ctl.rendered().ids(), vec![D, A, C]);

                // The batch still names B, which is gone
                store.stop_holding();
                store.release_one();
                let outcome = flight.await.unwrap();
                assert!(matches!(outcome, MoveOutcome::RolledBack(ReorderError::TransactionRejected(_))));

                assert_eq!(ctl.rendered().ids(), vec![A, C, D]);
                assert_eq!(store.ordered_ids(7), vec![A, C, D]);
                assert!(ctl.refresh().await.unwrap());
            })
            .await;
    }
}
