//! Index search client traits and types

use super::error::IndexError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Document metadata returned by a search
///
/// The document body is never fetched by the batch runner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub id: String,
    /// Top level document for embedded documents
    #[serde(default, alias = "rootDocument")]
    pub root_id: Option<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub dirname: String,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    #[serde(default)]
    pub extraction_level: u32,
}

impl Document {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let dirname = match path.rfind('/') {
            Some(0) => "/".to_string(),
            Some(i) => path[..i].to_string(),
            None => String::new(),
        };
        Self {
            id: id.into(),
            path,
            dirname,
            ..Default::default()
        }
    }
}

/// Parameters of a scrolled search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollRequest {
    /// Index (collection) to search
    pub project: String,
    /// Query text
    pub query: String,
    pub fuzziness: u32,
    pub phrase_matches: bool,
    /// Accepted content types, empty means any
    pub file_types: Vec<String>,
    /// Accepted directory prefixes, empty means any
    pub path_prefixes: Vec<String>,
    /// Source fields left out of the returned documents
    pub excluded_fields: Vec<String>,
    /// Page size
    pub size: usize,
}

impl ScrollRequest {
    /// Create a request on `project` matching everything
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            query: "*".to_string(),
            fuzziness: 0,
            phrase_matches: false,
            file_types: Vec::new(),
            path_prefixes: Vec::new(),
            excluded_fields: Vec::new(),
            size: 10,
        }
    }

    /// Set the query text and its match options
    pub fn with(mut self, query: impl Into<String>, fuzziness: u32, phrase_matches: bool) -> Self {
        self.query = query.into();
        self.fuzziness = fuzziness;
        self.phrase_matches = phrase_matches;
        self
    }

    pub fn with_file_types(mut self, file_types: &[String]) -> Self {
        self.file_types = file_types.to_vec();
        self
    }

    pub fn with_path_prefixes(mut self, prefixes: &[String]) -> Self {
        self.path_prefixes = prefixes.to_vec();
        self
    }

    /// Leave `field` out of the returned documents
    pub fn without_source(mut self, field: impl Into<String>) -> Self {
        self.excluded_fields.push(field.into());
        self
    }

    pub fn limit(mut self, size: usize) -> Self {
        self.size = size;
        self
    }
}

/// Client of the document index
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Open a scrolled search; no request is made until the first page
    async fn scroll(&self, request: ScrollRequest) -> Result<Box<dyn SearchCursor>, IndexError>;

    /// Release the client
    async fn close(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

/// An open scroll over the matches of one request
///
/// Once `next_page` returns an empty page the cursor is exhausted and must
/// not be used again.
#[async_trait]
pub trait SearchCursor: Send {
    /// Next page of matches, empty when there are no more
    async fn next_page(&mut self) -> Result<Vec<Document>, IndexError>;

    /// Free the server side scroll context
    async fn clear(&mut self) -> Result<(), IndexError> {
        Ok(())
    }
}
