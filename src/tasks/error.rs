//! Batch search failures and their classification

use crate::batch::{FailureKind, SearchFailure, StoreError};
use crate::index::IndexError;
use thiserror::Error;

/// Error interrupting a batch search
#[derive(Debug, Clone, Error)]
pub enum BatchError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Batch timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Build the failure recorded for `query` from the error that stopped it
///
/// Backend status errors are reported through the most specific cause: the
/// first low level response error attached to them, or the status error
/// itself when none is attached.
pub fn classify(query: &str, error: &BatchError) -> SearchFailure {
    let (kind, message) = match error {
        BatchError::Index(err @ IndexError::Status { .. }) => {
            let cause = err
                .suppressed()
                .iter()
                .find(|e| matches!(e, IndexError::Response(_)))
                .unwrap_or(err);
            (FailureKind::Backend, cause.to_string())
        }
        // a raw error response is still the backend refusing the query
        BatchError::Index(err @ IndexError::Response(_)) => {
            (FailureKind::Backend, err.to_string())
        }
        BatchError::Timeout { .. } => (FailureKind::Timeout, error.to_string()),
        other => (FailureKind::Generic, other.to_string()),
    };

    SearchFailure {
        query: query.to_string(),
        kind,
        message,
    }
}
