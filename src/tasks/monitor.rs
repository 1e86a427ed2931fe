//! Progress reporting of running tasks

use crate::batch::User;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Task able to report how far it is
pub trait Monitorable {
    /// Ratio of work done, `0.0` before anything started
    fn progress_rate(&self) -> f64;
}

/// Task running on behalf of a user
pub trait UserTask {
    fn user(&self) -> &User;
}

/// Batch counters of a runner
///
/// Written by the task running the batches, readable from any thread. The
/// counters only grow, so relaxed loads are enough.
#[derive(Debug, Default)]
pub struct RunProgress {
    total: AtomicUsize,
    processed: AtomicUsize,
}

impl RunProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the number of batch searches found by a pull
    pub fn start(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
    }

    /// Record one more processed batch search
    pub fn inc_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }
}

impl Monitorable for RunProgress {
    fn progress_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.processed() as f64 / total as f64
        }
    }
}
