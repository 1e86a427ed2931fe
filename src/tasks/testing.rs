//! Scripted collaborators for runner tests

use crate::index::{Document, IndexError, Indexer, ScrollRequest, SearchCursor};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Page = Result<Vec<Document>, IndexError>;

#[derive(Default)]
struct Shared {
    scripts: Mutex<HashMap<String, VecDeque<Page>>>,
    requests: Mutex<Vec<ScrollRequest>>,
    fetched: Mutex<HashMap<String, usize>>,
    cleared: Mutex<Vec<String>>,
}

/// Indexer returning pre-recorded pages per query text
#[derive(Default, Clone)]
pub struct ScriptedIndexer {
    shared: Arc<Shared>,
    closed: Arc<AtomicBool>,
}

impl ScriptedIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages served to the next cursor opened for `query`
    pub fn script(self, query: &str, pages: Vec<Page>) -> Self {
        self.shared
            .scripts
            .lock()
            .unwrap()
            .insert(query.to_string(), pages.into());
        self
    }

    /// Successful pages of `sizes` documents each
    pub fn pages(self, query: &str, sizes: &[usize]) -> Self {
        let pages = sizes
            .iter()
            .enumerate()
            .map(|(p, &n)| Ok(docs(&format!("{}-{}", query, p), n)))
            .collect();
        self.script(query, pages)
    }

    pub fn requests(&self) -> Vec<ScrollRequest> {
        self.shared.requests.lock().unwrap().clone()
    }

    /// Number of `next_page` calls made for `query`
    pub fn fetched(&self, query: &str) -> usize {
        self.shared.fetched.lock().unwrap().get(query).copied().unwrap_or(0)
    }

    pub fn cleared(&self) -> Vec<String> {
        self.shared.cleared.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Indexer for ScriptedIndexer {
    async fn scroll(&self, request: ScrollRequest) -> Result<Box<dyn SearchCursor>, IndexError> {
        let pages = self
            .shared
            .scripts
            .lock()
            .unwrap()
            .remove(&request.query)
            .unwrap_or_default();
        let query = request.query.clone();
        self.shared.requests.lock().unwrap().push(request);
        Ok(Box::new(ScriptedCursor {
            query,
            pages,
            shared: self.shared.clone(),
        }))
    }

    async fn close(&self) -> Result<(), IndexError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct ScriptedCursor {
    query: String,
    pages: VecDeque<Page>,
    shared: Arc<Shared>,
}

#[async_trait]
impl SearchCursor for ScriptedCursor {
    async fn next_page(&mut self) -> Result<Vec<Document>, IndexError> {
        *self
            .shared
            .fetched
            .lock()
            .unwrap()
            .entry(self.query.clone())
            .or_insert(0) += 1;
        self.pages.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn clear(&mut self) -> Result<(), IndexError> {
        self.shared.cleared.lock().unwrap().push(self.query.clone());
        Ok(())
    }
}

/// `n` documents with ids prefixed by `prefix`
pub fn docs(prefix: &str, n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| Document::new(format!("{}-{}", prefix, i), format!("/data/{}/{}.txt", prefix, i)))
        .collect()
}
