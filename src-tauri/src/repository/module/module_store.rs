//! Ordering engine adapter
//!
//! Implements the engine's `OrderStore` on top of the repository so an
//! `OptimisticUpdateController` can run against SQLite in-process.

use async_trait::async_trait;
use sibling_order::{ItemId, OrderStore, OrderUpdate, ParentId, ReorderError, ReorderResult};

use crate::domain::{DomainError, Module};
use crate::repository::traits::Repository;
use super::module_positioning::ModulePositioningOperations;
use super::module_repo::ModuleRepository;

impl From<DomainError> for ReorderError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(msg) | DomainError::InvalidInput(msg) => ReorderError::Validation(msg),
            DomainError::Conflict(msg) | DomainError::Internal(msg) => ReorderError::TransactionRejected(msg),
        }
    }
}

#[async_trait(?Send)]
impl OrderStore for ModuleRepository {
    type Item = Module;
    /// Title of the new module
    type Draft = String;

    async fn list_siblings(&self, parent_id: ParentId) -> ReorderResult<Vec<Module>> {
        Ok(self.list_by_course(parent_id).await?)
    }

    async fn persist_order(&self, parent_id: ParentId, updates: &[OrderUpdate]) -> ReorderResult<()> {
        Ok(ModulePositioningOperations::persist_order(self, parent_id, updates).await?)
    }

    async fn create_sibling(&self, parent_id: ParentId, draft: String) -> ReorderResult<Module> {
        Ok(self.create(&Module::new(0, parent_id, draft)).await?)
    }

    async fn delete_sibling(&self, parent_id: ParentId, id: ItemId) -> ReorderResult<()> {
        match self.find_by_id(id).await? {
            Some(module) if module.course_id == parent_id => Ok(self.delete(id).await?),
            _ => Err(ReorderError::Validation(format!("module {} is not in course {}", id, parent_id))),
        }
    }
}
