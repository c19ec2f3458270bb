//! Module Repository
//!
//! - module_repo: Core CRUD (append on create, compact on delete)
//! - module_positioning: Atomic reordering of a course's modules
//! - module_store: Adapter that lets the ordering engine drive SQLite directly

mod module_repo;
mod module_positioning;
mod module_store;

pub use module_repo::ModuleRepository;
pub use module_positioning::ModulePositioningOperations;
