//! In-memory batch search store

use super::models::{BatchSearch, BatchState, SearchResult};
use super::repository::{BatchSearchRepository, StoreError};
use crate::index::Document;
use crate::MAX_SCROLL_SIZE;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    /// Batch searches in submission order
    batches: Vec<BatchSearch>,
    /// Results per batch search id
    results: HashMap<String, Vec<SearchResult>>,
    closed: bool,
}

/// Store keeping batch searches and results in process memory
///
/// Every operation takes the lock once, so a page write or a state
/// transition is atomic with respect to other runners sharing the store.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    inner: RwLock<Inner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a batch search
    pub fn save(&self, batch: BatchSearch) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.results.entry(batch.id.clone()).or_default();
        match inner.batches.iter_mut().find(|b| b.id == batch.id) {
            Some(existing) => *existing = batch,
            None => inner.batches.push(batch),
        }
        Ok(())
    }

    /// Results recorded for a batch search, in insertion order
    pub fn results(&self, id: &str) -> Result<Vec<SearchResult>, StoreError> {
        let inner = self.read()?;
        Ok(inner.results.get(id).cloned().unwrap_or_default())
    }

    /// Current state of a batch search
    pub fn state(&self, id: &str) -> Result<BatchState, StoreError> {
        let inner = self.read()?;
        inner
            .batches
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.state.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// All batch searches, in submission order
    pub fn all(&self) -> Result<Vec<BatchSearch>, StoreError> {
        Ok(self.read()?.batches.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().map(|inner| inner.closed).unwrap_or(true)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        if inner.closed {
            return Err(StoreError::Closed);
        }
        Ok(inner)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        let inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        if inner.closed {
            return Err(StoreError::Closed);
        }
        Ok(inner)
    }
}

#[async_trait]
impl BatchSearchRepository for MemoryRepository {
    async fn get_queued(&self) -> Result<Vec<BatchSearch>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .batches
            .iter()
            .filter(|b| b.state.is_queued())
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<BatchSearch, StoreError> {
        let inner = self.read()?;
        inner
            .batches
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn set_state(&self, id: &str, state: BatchState) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let batch = inner
            .batches
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !batch.state.can_transition_to(&state) {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: batch.state.name(),
                to: state.name(),
            });
        }
        debug!("batch search {}: {} -> {}", id, batch.state.name(), state.name());
        batch.state = state;
        Ok(())
    }

    async fn save_results(
        &self,
        id: &str,
        query: &str,
        documents: &[Document],
    ) -> Result<(), StoreError> {
        if documents.len() > MAX_SCROLL_SIZE {
            return Err(StoreError::PageTooLarge {
                size: documents.len(),
                max: MAX_SCROLL_SIZE,
            });
        }

        let mut inner = self.write()?;
        let batch = inner
            .batches
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(entry) = batch.queries.iter_mut().find(|q| q.query == query) {
            entry.result_count += documents.len();
        }

        let results = inner.results.entry(id.to_string()).or_default();
        let offset = results.len();
        results.extend(
            documents
                .iter()
                .enumerate()
                .map(|(i, doc)| SearchResult::from_document(id, query, offset + i + 1, doc)),
        );
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{FailureKind, SearchFailure, User};

    fn docs(prefix: &str, n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| Document::new(format!("{}-{}", prefix, i), format!("/{}/{}.txt", prefix, i)))
            .collect()
    }

    fn store_with(batch: &BatchSearch) -> MemoryRepository {
        let store = MemoryRepository::new();
        store.save(batch.clone()).unwrap();
        store
    }

    #[tokio::test]
    async fn test_get_queued_filters_and_keeps_order() {
        let store = MemoryRepository::new();
        let first = BatchSearch::new("prj", "first", User::local(), ["a"]);
        let done =
            BatchSearch::new("prj", "done", User::local(), ["a"]).with_state(BatchState::Success);
        let last = BatchSearch::new("prj", "last", User::local(), ["a"]);
        for batch in [&first, &done, &last] {
            store.save(batch.clone()).unwrap();
        }

        let queued = store.get_queued().await.unwrap();
        let ids: Vec<&str> = queued.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), last.id.as_str()]);
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let store = MemoryRepository::new();
        let err = store.get("nope").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("nope".to_string()));
    }

    #[tokio::test]
    async fn test_state_machine_is_enforced() {
        let batch = BatchSearch::new("prj", "b", User::local(), ["a"]);
        let store = store_with(&batch);

        let err = store.set_state(&batch.id, BatchState::Success).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { from: "QUEUED", to: "SUCCESS", .. }));

        store.set_state(&batch.id, BatchState::Running).await.unwrap();
        let failure = SearchFailure {
            query: "a".to_string(),
            kind: FailureKind::Timeout,
            message: "too slow".to_string(),
        };
        store.set_state(&batch.id, BatchState::Failure(failure.clone())).await.unwrap();
        assert_eq!(store.state(&batch.id).unwrap(), BatchState::Failure(failure));

        assert!(store.set_state(&batch.id, BatchState::Running).await.is_err());
    }

    #[tokio::test]
    async fn test_save_results_tags_query_and_numbers_documents() {
        let batch = BatchSearch::new("prj", "b", User::local(), ["foo", "bar"]);
        let store = store_with(&batch);

        store.save_results(&batch.id, "foo", &docs("foo", 2)).await.unwrap();
        store.save_results(&batch.id, "bar", &docs("bar", 3)).await.unwrap();

        let results = store.results(&batch.id).unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].query, "foo");
        assert_eq!(results[0].doc_nb, 1);
        assert_eq!(results[4].query, "bar");
        assert_eq!(results[4].doc_nb, 5);
        assert_eq!(results[4].document_path, "/bar/2.txt");

        let stored = store.get(&batch.id).await.unwrap();
        assert_eq!(stored.queries[0].result_count, 2);
        assert_eq!(stored.queries[1].result_count, 3);
    }

    #[tokio::test]
    async fn test_save_results_rejects_oversized_page() {
        let batch = BatchSearch::new("prj", "b", User::local(), ["foo"]);
        let store = store_with(&batch);

        let err = store
            .save_results(&batch.id, "foo", &docs("foo", MAX_SCROLL_SIZE + 1))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::PageTooLarge {
                size: MAX_SCROLL_SIZE + 1,
                max: MAX_SCROLL_SIZE
            }
        );
        assert!(store.results(&batch.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_store_refuses_calls() {
        let store = MemoryRepository::new();
        store.close().await.unwrap();

        assert!(store.is_closed());
        assert_eq!(store.get_queued().await.unwrap_err(), StoreError::Closed);
    }
}
