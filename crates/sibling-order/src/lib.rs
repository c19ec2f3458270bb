//! Sibling Order Engine
//!
//! Keeps a dense `1..=N` order over the children of one parent while the user
//! drags them around:
//! - model: ordered collection with pure move/insert/remove
//! - gesture: click-vs-drag state machine (pointer and keyboard)
//! - gateway: store boundary and batched commits
//! - queue: per-parent commit serialization with coalescing
//! - optimistic: confirmed/optimistic state with rollback
//! - cache: lazily fetched child content

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod gesture;
pub mod item;
pub mod memory;
pub mod model;
pub mod optimistic;
pub mod queue;

pub use cache::{ChildContentCache, ChildLoader};
pub use config::{BatchPolicy, ReorderConfig};
pub use error::{ReorderError, ReorderResult};
pub use gateway::{OrderPersistenceGateway, OrderStore};
pub use gesture::{DragGestureController, GestureEvent, GestureInput, GestureKey, GesturePhase};
pub use item::{ItemId, OrderUpdate, OrderedItem, ParentId, Sibling};
pub use memory::MemoryOrderStore;
pub use model::OrderedCollection;
pub use optimistic::{CommitStatus, MoveOutcome, OptimisticUpdateController};
pub use queue::{QueueOutcome, ReorderCommitQueue};
