//! Batch search execution

use super::budget::BatchBudget;
use super::error::{classify, BatchError};
use super::monitor::{Monitorable, RunProgress, UserTask};
use crate::batch::{BatchSearch, BatchSearchRepository, BatchState, StoreError, User};
use crate::config::{
    parse_or, ConfigSource, BATCH_SEARCH_MAX_TIME, BATCH_SEARCH_THROTTLE, SCROLL_SIZE,
};
use crate::index::{Indexer, ScrollRequest, SearchCursor, CONTENT_FIELD};
use crate::time::{Clock, SystemClock};
use crate::{DEFAULT_MAX_TIME_SECONDS, DEFAULT_SCROLL_SIZE, DEFAULT_THROTTLE_MS, MAX_SCROLL_SIZE};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Tunables of one batch search run, read when the run starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Pause between two pages
    pub throttle_ms: u64,
    /// Time budget of one query
    pub max_time_seconds: u64,
    /// Page size, never above [`MAX_SCROLL_SIZE`]
    pub scroll_size: usize,
}

impl RunSettings {
    pub fn resolve(config: &dyn ConfigSource) -> Self {
        Self {
            throttle_ms: parse_or(
                config.get(BATCH_SEARCH_THROTTLE),
                BATCH_SEARCH_THROTTLE,
                DEFAULT_THROTTLE_MS,
            ),
            max_time_seconds: parse_or(
                config.get(BATCH_SEARCH_MAX_TIME),
                BATCH_SEARCH_MAX_TIME,
                DEFAULT_MAX_TIME_SECONDS,
            ),
            scroll_size: parse_or(config.get(SCROLL_SIZE), SCROLL_SIZE, DEFAULT_SCROLL_SIZE)
                .min(MAX_SCROLL_SIZE),
        }
    }

    fn max_time_millis(&self) -> i64 {
        i64::try_from(self.max_time_seconds.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}

/// Runs the queued batch searches of a store against the index
///
/// Batch searches and their queries are processed one after the other on
/// the calling task. Progress counters are shared through [`RunProgress`]
/// and may be read concurrently.
pub struct BatchSearchRunner {
    indexer: Arc<dyn Indexer>,
    repository: Arc<dyn BatchSearchRepository>,
    config: Arc<dyn ConfigSource>,
    clock: Arc<dyn Clock>,
    user: User,
    progress: Arc<RunProgress>,
}

impl BatchSearchRunner {
    /// Create a runner using the system clock
    pub fn new(
        indexer: Arc<dyn Indexer>,
        repository: Arc<dyn BatchSearchRepository>,
        config: Arc<dyn ConfigSource>,
        user: User,
    ) -> Self {
        Self {
            indexer,
            repository,
            config,
            clock: Arc::new(SystemClock),
            user,
            progress: Arc::new(RunProgress::new()),
        }
    }

    /// Replace the clock used for throttling and timeouts
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Handle on the progress counters, for monitoring from elsewhere
    pub fn progress(&self) -> Arc<RunProgress> {
        self.progress.clone()
    }

    /// Run every queued batch search, returning the total number of results
    ///
    /// A failing batch search is recorded as such and does not stop the
    /// following ones.
    pub async fn run_all(&self) -> Result<usize, StoreError> {
        let batch_searches = self.repository.get_queued().await?;
        self.progress.start(batch_searches.len());
        info!("found {} queued batch searches", batch_searches.len());

        let mut total_results = 0;
        for batch_search in &batch_searches {
            total_results += self.run(batch_search).await;
            self.progress.inc_processed();
        }
        info!("done {} batch searches", batch_searches.len());
        Ok(total_results)
    }

    /// Run one batch search if it is still queued, otherwise do nothing
    pub async fn run_one(&self, id: &str) -> Result<usize, StoreError> {
        let batch_search = self.repository.get(id).await?;
        if !batch_search.state.is_queued() {
            debug!("batch search {} is {}, skipping", id, batch_search.state.name());
            return Ok(0);
        }
        Ok(self.run(&batch_search).await)
    }

    /// Run a queued batch search and return the number of results saved
    ///
    /// Failures are stored in the batch search state; the results saved
    /// before the failure are kept and counted.
    pub async fn run(&self, batch_search: &BatchSearch) -> usize {
        let settings = RunSettings::resolve(self.config.as_ref());
        info!(
            "running {} queries for batch search {} on project {} with throttle {}ms and scroll size of {}",
            batch_search.queries.len(),
            batch_search.id,
            batch_search.project,
            settings.throttle_ms,
            settings.scroll_size
        );

        if let Err(e) = self.repository.set_state(&batch_search.id, BatchState::Running).await {
            error!("cannot start batch search {}: {}", batch_search.id, e);
            return 0;
        }

        let mut budget = BatchBudget::new();
        for query in batch_search.query_strings() {
            if let Err(e) = self.run_query(batch_search, query, &settings, &mut budget).await {
                error!(
                    "error when running batch {} on query {:?}: {}",
                    batch_search.id, query, e
                );
                let failure = classify(query, &e);
                if let Err(e) = self
                    .repository
                    .set_state(&batch_search.id, BatchState::Failure(failure))
                    .await
                {
                    error!("cannot record failure of batch search {}: {}", batch_search.id, e);
                }
                return budget.total();
            }
        }

        match self.repository.set_state(&batch_search.id, BatchState::Success).await {
            Ok(()) => info!("done batch search {} with success", batch_search.id),
            Err(e) => error!("cannot record success of batch search {}: {}", batch_search.id, e),
        }
        budget.total()
    }

    async fn run_query(
        &self,
        batch_search: &BatchSearch,
        query: &str,
        settings: &RunSettings,
        budget: &mut BatchBudget,
    ) -> Result<(), BatchError> {
        let request = ScrollRequest::new(&batch_search.project)
            .with(query, batch_search.fuzziness, batch_search.phrase_matches)
            .with_file_types(&batch_search.file_types)
            .with_path_prefixes(&batch_search.paths)
            .without_source(CONTENT_FIELD)
            .limit(settings.scroll_size);
        let mut cursor = self.indexer.scroll(request).await?;

        let result = self
            .scroll_pages(batch_search, query, settings, budget, cursor.as_mut())
            .await;

        if let Err(e) = cursor.clear().await {
            warn!("cannot clear scroll of query {:?}: {}", query, e);
        }
        result
    }

    async fn scroll_pages(
        &self,
        batch_search: &BatchSearch,
        query: &str,
        settings: &RunSettings,
        budget: &mut BatchBudget,
        cursor: &mut dyn SearchCursor,
    ) -> Result<(), BatchError> {
        let mut documents = cursor.next_page().await?;
        let started = self.clock.now_millis();

        // an exhausted budget drops the page already fetched
        while !documents.is_empty() && budget.has_room() {
            self.repository
                .save_results(&batch_search.id, query, &documents)
                .await?;

            if self.clock.now_millis() - started < settings.max_time_millis() {
                self.clock.sleep(settings.throttle_ms).await;
            } else {
                return Err(BatchError::Timeout {
                    seconds: settings.max_time_seconds,
                });
            }
            budget.record(documents.len());
            documents = cursor.next_page().await?;
        }
        Ok(())
    }

    /// Release the index client and the store
    ///
    /// Both are closed even if the first one fails; the first error wins.
    pub async fn close(self) -> anyhow::Result<()> {
        let indexer = self.indexer.close().await;
        let repository = self.repository.close().await;
        indexer?;
        repository?;
        Ok(())
    }
}

impl Monitorable for BatchSearchRunner {
    fn progress_rate(&self) -> f64 {
        self.progress.progress_rate()
    }
}

impl UserTask for BatchSearchRunner {
    fn user(&self) -> &User {
        &self.user
    }
}
