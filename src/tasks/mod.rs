//! Batch search tasks
//!
//! The runner pulls queued batch searches from a store, scrolls each of
//! their queries through the index and saves the pages as they come, under
//! a throttle, a per query time budget and a per batch result budget.

mod budget;
mod error;
mod factory;
mod monitor;
mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use budget::BatchBudget;
pub use error::{classify, BatchError};
pub use factory::{DefaultTaskFactory, TaskFactory};
pub use monitor::{Monitorable, RunProgress, UserTask};
pub use runner::{BatchSearchRunner, RunSettings};
