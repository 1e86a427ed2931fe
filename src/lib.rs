//! batchsearch-rs: runs multi-query batch searches against a document index
//!
//! Queued batch searches are taken from a store, each query is scrolled
//! page by page through the index, and every page is saved back to the
//! store as it arrives, under a throttle and time budget.

pub mod batch;
pub mod config;
pub mod index;
pub mod network;
pub mod tasks;
pub mod time;

pub use batch::{BatchSearch, BatchSearchRepository, BatchState, MemoryRepository, User};
pub use config::Settings;
pub use index::{ElasticsearchIndexer, Indexer};
pub use tasks::{BatchSearchRunner, DefaultTaskFactory, Monitorable, TaskFactory};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum page size
///
/// Each saved result binds 9 values in a multi-row insert, and a statement
/// may bind at most 32768 values, so a page must stay under 32768 / 9 (3640).
pub const MAX_SCROLL_SIZE: usize = 3500;

/// Maximum number of results recorded for one batch search
pub const MAX_BATCH_RESULT_SIZE: usize = 60000;

/// Default pause between two pages, in milliseconds
pub const DEFAULT_THROTTLE_MS: u64 = 0;

/// Default time budget of one query, in seconds
pub const DEFAULT_MAX_TIME_SECONDS: u64 = 100_000;

/// Default requested page size
pub const DEFAULT_SCROLL_SIZE: usize = 1000;
