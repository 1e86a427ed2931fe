//! Construction of per-user tasks

use super::runner::BatchSearchRunner;
use crate::batch::{BatchSearchRepository, User};
use crate::config::ConfigSource;
use crate::index::Indexer;
use crate::time::{Clock, SystemClock};
use std::sync::Arc;

/// Creates task instances bound to one user
pub trait TaskFactory: Send + Sync {
    fn create_batch_search_runner(&self, user: User) -> BatchSearchRunner;
}

/// Factory sharing one index client, store, configuration and clock
/// between all the runners it creates
#[derive(Clone)]
pub struct DefaultTaskFactory {
    indexer: Arc<dyn Indexer>,
    repository: Arc<dyn BatchSearchRepository>,
    config: Arc<dyn ConfigSource>,
    clock: Arc<dyn Clock>,
}

impl DefaultTaskFactory {
    pub fn new(
        indexer: Arc<dyn Indexer>,
        repository: Arc<dyn BatchSearchRepository>,
        config: Arc<dyn ConfigSource>,
    ) -> Self {
        Self {
            indexer,
            repository,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl TaskFactory for DefaultTaskFactory {
    fn create_batch_search_runner(&self, user: User) -> BatchSearchRunner {
        BatchSearchRunner::new(
            self.indexer.clone(),
            self.repository.clone(),
            self.config.clone(),
            user,
        )
        .with_clock(self.clock.clone())
    }
}
