//! Result budget of one batch search

use crate::{MAX_BATCH_RESULT_SIZE, MAX_SCROLL_SIZE};

/// Running count of results recorded for a whole batch search
///
/// The count is shared by every query of the batch and never reset between
/// them. Once it reaches [`BatchBudget::LIMIT`] no page is persisted anymore
/// for the rest of the batch: later queries still open a scroll and fetch
/// their first page, which is then dropped without being saved and without
/// any error. Keeping one page size of headroom under
/// [`MAX_BATCH_RESULT_SIZE`] guarantees the total never exceeds it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchBudget {
    total: usize,
}

impl BatchBudget {
    /// Count at which the batch stops persisting pages
    pub const LIMIT: usize = MAX_BATCH_RESULT_SIZE - MAX_SCROLL_SIZE;

    pub fn new() -> Self {
        Self::default()
    }

    /// Whether another page may be persisted
    pub fn has_room(&self) -> bool {
        self.total < Self::LIMIT
    }

    /// Account for a persisted page
    pub fn record(&mut self, page_size: usize) {
        self.total += page_size;
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
