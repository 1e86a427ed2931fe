//! Batch search store contract

use super::models::{BatchSearch, BatchState};
use crate::index::Document;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a batch search store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("batch search {0} not found")]
    NotFound(String),

    #[error("batch search {id}: cannot go from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("page of {size} results exceeds the write limit of {max}")]
    PageTooLarge { size: usize, max: usize },

    #[error("store is closed")]
    Closed,

    #[error("store error: {0}")]
    Backend(String),
}

/// Durable repository of batch searches and their results
///
/// Implementations own the consistency of concurrent writes: several
/// runners (one per user) may share one store.
#[async_trait]
pub trait BatchSearchRepository: Send + Sync {
    /// Batch searches in `Queued` state, in the order they should run
    async fn get_queued(&self) -> Result<Vec<BatchSearch>, StoreError>;

    /// Batch search by id, `StoreError::NotFound` when absent
    async fn get(&self, id: &str) -> Result<BatchSearch, StoreError>;

    /// Persist a state transition
    async fn set_state(&self, id: &str, state: BatchState) -> Result<(), StoreError>;

    /// Append one page of results for `query`, atomically
    async fn save_results(
        &self,
        id: &str,
        query: &str,
        documents: &[Document],
    ) -> Result<(), StoreError>;

    /// Release the underlying resources
    async fn close(&self) -> Result<(), StoreError>;
}
