//! Batch searches and their store
//!
//! Defines the batch search model, its lifecycle state machine and the
//! repository contract the runner writes to.

mod memory;
mod models;
mod repository;

pub use memory::MemoryRepository;
pub use models::*;
pub use repository::{BatchSearchRepository, StoreError};
