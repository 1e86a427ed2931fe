//! Batch search data models

use crate::index::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// User owning a batch search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct User {
    pub id: String,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Placeholder user for single user setups
    pub fn local() -> Self {
        Self::new("local")
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A query of a batch search with its metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuery {
    /// Query text sent to the index
    pub query: String,
    /// Number of results recorded for this query
    #[serde(default)]
    pub result_count: usize,
}

/// Category of a batch search failure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Error reported by the search backend
    Backend,
    /// Per query time budget exceeded
    Timeout,
    /// Anything else (store, transport, decoding)
    Generic,
}

/// Cause of a failed batch search, with the query that was running
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchFailure {
    pub query: String,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for SearchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query {:?} failed: {}", self.query, self.message)
    }
}

/// Lifecycle state of a batch search
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchState {
    #[default]
    Queued,
    Running,
    Success,
    Failure(SearchFailure),
}

impl BatchState {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: &BatchState) -> bool {
        matches!(
            (self, next),
            (BatchState::Queued, BatchState::Running)
                | (BatchState::Running, BatchState::Success)
                | (BatchState::Running, BatchState::Failure(_))
        )
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, BatchState::Queued)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BatchState::Queued => "QUEUED",
            BatchState::Running => "RUNNING",
            BatchState::Success => "SUCCESS",
            BatchState::Failure(_) => "FAILURE",
        }
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchState::Failure(failure) => write!(f, "FAILURE ({})", failure),
            other => f.write_str(other.name()),
        }
    }
}

/// A submitted batch search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSearch {
    pub id: String,
    /// Index (collection) searched
    pub project: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub user: User,
    /// Queries in execution order, without duplicates
    #[serde(deserialize_with = "unique_queries")]
    pub queries: Vec<BatchQuery>,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
    /// Fuzziness (or phrase slop when `phrase_matches` is set)
    #[serde(default)]
    pub fuzziness: u32,
    #[serde(default)]
    pub phrase_matches: bool,
    /// Content types the documents must have
    #[serde(default)]
    pub file_types: Vec<String>,
    /// Directory prefixes the documents must be under
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub state: BatchState,
}

impl BatchSearch {
    /// Create a queued batch search with a fresh id
    pub fn new<I, S>(
        project: impl Into<String>,
        name: impl Into<String>,
        user: User,
        queries: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut batch = Self {
            id: uuid::Uuid::new_v4().to_string(),
            project: project.into(),
            name: name.into(),
            description: String::new(),
            user,
            queries: Vec::new(),
            date: Utc::now(),
            fuzziness: 0,
            phrase_matches: false,
            file_types: Vec::new(),
            paths: Vec::new(),
            state: BatchState::Queued,
        };
        for query in queries {
            batch.add_query(query);
        }
        batch
    }

    /// Append a query; duplicates keep their first position
    pub fn add_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if !self.queries.iter().any(|q| q.query == query) {
            self.queries.push(BatchQuery {
                query,
                result_count: 0,
            });
        }
    }

    pub fn with_fuzziness(mut self, fuzziness: u32) -> Self {
        self.fuzziness = fuzziness;
        self
    }

    pub fn with_phrase_matches(mut self, phrase_matches: bool) -> Self {
        self.phrase_matches = phrase_matches;
        self
    }

    pub fn with_file_types<I: IntoIterator<Item = S>, S: Into<String>>(mut self, types: I) -> Self {
        self.file_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_paths<I: IntoIterator<Item = S>, S: Into<String>>(mut self, paths: I) -> Self {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_state(mut self, state: BatchState) -> Self {
        self.state = state;
        self
    }

    /// Query strings in execution order
    pub fn query_strings(&self) -> impl Iterator<Item = &str> {
        self.queries.iter().map(|q| q.query.as_str())
    }
}

/// Queries of a submission keyed by their text: a repeated query keeps its
/// first position and metadata
fn unique_queries<'de, D>(deserializer: D) -> Result<Vec<BatchQuery>, D::Error>
where
    D: Deserializer<'de>,
{
    let submitted = Vec::<BatchQuery>::deserialize(deserializer)?;
    let mut queries: Vec<BatchQuery> = Vec::with_capacity(submitted.len());
    for query in submitted {
        if !queries.iter().any(|q| q.query == query.query) {
            queries.push(query);
        }
    }
    Ok(queries)
}

/// One persisted result row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub batch_id: String,
    pub query: String,
    /// Position of the result within its batch search
    pub doc_nb: usize,
    pub document_id: String,
    pub root_id: String,
    pub document_path: String,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub creation_date: DateTime<Utc>,
}

impl SearchResult {
    pub fn from_document(batch_id: &str, query: &str, doc_nb: usize, document: &Document) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            query: query.to_string(),
            doc_nb,
            document_id: document.id.clone(),
            root_id: document.root_id.clone().unwrap_or_else(|| document.id.clone()),
            document_path: document.path.clone(),
            content_type: document.content_type.clone(),
            content_length: document.content_length,
            creation_date: Utc::now(),
        }
    }
}
