//! Index client errors

use thiserror::Error;

/// Low level HTTP response error returned by the index backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("method [{method}], endpoint [{endpoint}], status line [{status}]: {body}")]
pub struct ResponseError {
    pub method: String,
    pub endpoint: String,
    pub status: u16,
    pub body: String,
}

/// Errors raised while searching the index
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexError {
    /// Structured failure reported by the backend
    ///
    /// `suppressed` holds the lower level errors the backend client attached
    /// while producing this one, most often the raw [`ResponseError`].
    #[error("index status {status}: {reason}")]
    Status {
        status: u16,
        reason: String,
        suppressed: Vec<IndexError>,
    },

    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("cannot decode index response: {0}")]
    Decode(String),
}

impl IndexError {
    /// Causes attached to this error
    pub fn suppressed(&self) -> &[IndexError] {
        match self {
            IndexError::Status { suppressed, .. } => suppressed,
            _ => &[],
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            IndexError::Status { status, .. } => Some(*status),
            IndexError::Response(response) => Some(response.status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for IndexError {
    fn from(e: reqwest::Error) -> Self {
        IndexError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(e: serde_json::Error) -> Self {
        IndexError::Decode(e.to_string())
    }
}
