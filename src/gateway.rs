//! IPC store for the ordering engine
//!
//! Implements the engine's store traits over Tauri commands. Every call
//! races a timer; a call that does not answer in time is reported as a
//! transport error, which the gateway may retry.

use std::future::Future;

use async_trait::async_trait;
use futures::future::{select, Either};
use gloo_timers::future::TimeoutFuture;
use sibling_order::{ChildLoader, ItemId, OrderStore, OrderUpdate, ParentId, ReorderError, ReorderResult};

use crate::commands::{self, CommandError};
use crate::models::{Lesson, Module};

pub struct TauriModuleStore {
    timeout_ms: u32,
}

impl TauriModuleStore {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }

    async fn with_timeout<T>(
        &self,
        what: &str,
        call: impl Future<Output = Result<T, CommandError>>,
    ) -> ReorderResult<T> {
        let call = Box::pin(call);
        let timer = TimeoutFuture::new(self.timeout_ms);
        match select(call, timer).await {
            Either::Left((result, _)) => result.map_err(ReorderError::from),
            Either::Right(_) => {
                log::warn!("{} timed out after {} ms", what, self.timeout_ms);
                Err(ReorderError::Transport(format!("{} got no answer within {} ms", what, self.timeout_ms)))
            }
        }
    }
}

#[async_trait(?Send)]
impl OrderStore for TauriModuleStore {
    type Item = Module;
    /// Title of the new module
    type Draft = String;

    async fn list_siblings(&self, parent_id: ParentId) -> ReorderResult<Vec<Module>> {
        self.with_timeout("list_modules", commands::list_modules(parent_id)).await
    }

    async fn persist_order(&self, parent_id: ParentId, updates: &[OrderUpdate]) -> ReorderResult<()> {
        self.with_timeout("persist_module_order", commands::persist_module_order(parent_id, updates))
            .await
    }

    async fn create_sibling(&self, parent_id: ParentId, draft: String) -> ReorderResult<Module> {
        self.with_timeout("create_module", commands::create_module(parent_id, &draft)).await
    }

    async fn delete_sibling(&self, _parent_id: ParentId, id: ItemId) -> ReorderResult<()> {
        self.with_timeout("delete_module", commands::delete_module(id)).await
    }
}

#[async_trait(?Send)]
impl ChildLoader for TauriModuleStore {
    type Child = Lesson;

    async fn load_children(&self, item_id: ItemId) -> ReorderResult<Vec<Lesson>> {
        self.with_timeout("list_lessons", commands::list_lessons(item_id)).await
    }
}
