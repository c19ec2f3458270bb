//! Child Content Cache
//!
//! Fetches the nested content of an item the first time it is expanded and
//! keeps it for the rest of the session. Expansion state lives here too, so
//! toggling an item never touches drag state.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::OnceCell;

use crate::error::ReorderResult;
use crate::item::ItemId;

/// Source of nested content
#[async_trait(?Send)]
pub trait ChildLoader {
    type Child: Clone;

    async fn load_children(&self, item_id: ItemId) -> ReorderResult<Vec<Self::Child>>;
}

pub struct ChildContentCache<L: ChildLoader> {
    loader: L,
    entries: RefCell<HashMap<ItemId, Rc<OnceCell<Rc<Vec<L::Child>>>>>>,
    expanded: RefCell<HashSet<ItemId>>,
}

impl<L: ChildLoader> ChildContentCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            entries: RefCell::new(HashMap::new()),
            expanded: RefCell::new(HashSet::new()),
        }
    }

    /// Cached children, fetching them on first use.
    ///
    /// Concurrent first calls share one fetch; a failed fetch is not cached.
    pub async fn get_children(&self, item_id: ItemId) -> ReorderResult<Rc<Vec<L::Child>>> {
        let cell = self
            .entries
            .borrow_mut()
            .entry(item_id)
            .or_insert_with(|| Rc::new(OnceCell::new()))
            .clone();

        let children = cell
            .get_or_try_init(|| async {
                debug!("fetching children of {}", item_id);
                self.loader.load_children(item_id).await.map(Rc::new)
            })
            .await?;
        Ok(children.clone())
    }

    /// Children if they were already fetched
    pub fn cached(&self, item_id: ItemId) -> Option<Rc<Vec<L::Child>>> {
        self.entries
            .borrow()
            .get(&item_id)
            .and_then(|cell| cell.get().cloned())
    }

    /// Flip expansion; returns the new state.
    pub fn toggle_expanded(&self, item_id: ItemId) -> bool {
        let mut expanded = self.expanded.borrow_mut();
        if expanded.remove(&item_id) {
            false
        } else {
            expanded.insert(item_id);
            true
        }
    }

    pub fn is_expanded(&self, item_id: ItemId) -> bool {
        self.expanded.borrow().contains(&item_id)
    }

    /// Drop fetched children so the next `get_children` refetches.
    /// Expansion is kept.
    pub fn invalidate(&self, item_id: ItemId) {
        self.entries.borrow_mut().remove(&item_id);
    }

    /// Forget an item that no longer exists.
    pub fn evict(&self, item_id: ItemId) {
        self.entries.borrow_mut().remove(&item_id);
        self.expanded.borrow_mut().remove(&item_id);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use tokio::task::LocalSet;

    use super::*;
    use crate::error::ReorderError;

    #[derive(Default)]
    struct CountingLoader {
        calls: Cell<usize>,
        fail_first: Cell<bool>,
    }

    #[async_trait(?Send)]
    impl ChildLoader for CountingLoader {
        type Child = String;

        async fn load_children(&self, item_id: ItemId) -> ReorderResult<Vec<String>> {
            self.calls.set(self.calls.get() + 1);
            tokio::task::yield_now().await;
            if self.fail_first.replace(false) {
                return Err(ReorderError::Transport("offline".into()));
            }
            Ok(vec![format!("lesson {}.1", item_id), format!("lesson {}.2", item_id)])
        }
    }

    #[tokio::test]
    async fn test_fetches_once_per_item() {
        let cache = ChildContentCache::new(CountingLoader::default());
        let first = cache.get_children(3).await.unwrap();
        let second = cache.get_children(3).await.unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.loader.calls.get(), 1);

        cache.get_children(4).await.unwrap();
        assert_eq!(cache.loader.calls.get(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_expansions_share_a_fetch() {
        LocalSet::new()
            .run_until(async {
                let cache = Rc::new(ChildContentCache::new(CountingLoader::default()));
                let a = tokio::task::spawn_local({
                    let cache = cache.clone();
                    async move { cache.get_children(1).await.map(|c| c.len()) }
                });
                let b = tokio::task::spawn_local({
                    let cache = cache.clone();
                    async move { cache.get_children(1).await.map(|c| c.len()) }
                });
                assert_eq!(a.await.unwrap().unwrap(), 2);
                assert_eq!(b.await.unwrap().unwrap(), 2);
                assert_eq!(cache.loader.calls.get(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let loader = CountingLoader::default();
        loader.fail_first.set(true);
        let cache = ChildContentCache::new(loader);

        assert!(cache.get_children(5).await.is_err());
        assert!(cache.cached(5).is_none());
        assert_eq!(cache.get_children(5).await.unwrap().len(), 2);
        assert_eq!(cache.loader.calls.get(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_refetches_but_keeps_expansion() {
        let cache = ChildContentCache::new(CountingLoader::default());
        cache.toggle_expanded(2);
        cache.get_children(2).await.unwrap();

        cache.invalidate(2);
        assert!(cache.cached(2).is_none());
        assert!(cache.is_expanded(2));
        cache.get_children(2).await.unwrap();
        assert_eq!(cache.loader.calls.get(), 2);
    }

    #[test]
    fn test_expansion_toggle() {
        let cache = ChildContentCache::new(CountingLoader::default());
        assert!(!cache.is_expanded(1));
        assert!(cache.toggle_expanded(1));
        assert!(cache.is_expanded(1));
        assert!(!cache.toggle_expanded(1));
        cache.toggle_expanded(1);
        cache.evict(1);
        assert!(!cache.is_expanded(1));
    }
}
