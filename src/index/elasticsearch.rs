//! Elasticsearch index client
//!
//! Uses the scroll REST API: the first page comes from
//! `POST /{index}/_search?scroll=..`, following pages from
//! `POST /_search/scroll`, and the context is released with
//! `DELETE /_search/scroll`.

use super::error::{IndexError, ResponseError};
use super::traits::{Document, Indexer, ScrollRequest, SearchCursor};
use crate::config::ElasticsearchSettings;
use crate::network::{HttpClient, HttpResponse};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Field holding the extracted text of a document
pub const CONTENT_FIELD: &str = "content";
const CONTENT_TYPE_FIELD: &str = "contentType";
const DIRNAME_FIELD: &str = "dirname";

#[derive(Debug, Deserialize)]
struct ScrollResponse {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_routing")]
    routing: Option<String>,
    #[serde(rename = "_source", default)]
    source: Option<Document>,
}

impl From<Hit> for Document {
    fn from(hit: Hit) -> Self {
        let mut document = hit.source.unwrap_or_default();
        document.id = hit.id;
        if document.root_id.is_none() {
            document.root_id = hit.routing;
        }
        document
    }
}

/// [`Indexer`] backed by an Elasticsearch cluster
#[derive(Clone)]
pub struct ElasticsearchIndexer {
    client: HttpClient,
    keep_alive: String,
}

impl ElasticsearchIndexer {
    /// Create an indexer from settings
    pub fn new(settings: &ElasticsearchSettings) -> anyhow::Result<Self> {
        Ok(Self::with_client(
            HttpClient::with_settings(settings)?,
            settings.scroll_keep_alive.clone(),
        ))
    }

    /// Create an indexer over an existing client
    pub fn with_client(client: HttpClient, keep_alive: impl Into<String>) -> Self {
        Self {
            client,
            keep_alive: keep_alive.into(),
        }
    }

    /// Build the `_search` body for a request
    pub fn search_body(request: &ScrollRequest) -> Value {
        let text_query = if request.phrase_matches {
            json!({
                "match_phrase": {
                    CONTENT_FIELD: { "query": request.query, "slop": request.fuzziness }
                }
            })
        } else if request.fuzziness > 0 {
            json!({
                "query_string": {
                    "query": request.query,
                    "default_field": CONTENT_FIELD,
                    "fuzziness": request.fuzziness
                }
            })
        } else {
            json!({
                "query_string": { "query": request.query, "default_field": CONTENT_FIELD }
            })
        };

        let mut filters = Vec::new();
        if !request.file_types.is_empty() {
            filters.push(json!({ "terms": { CONTENT_TYPE_FIELD: request.file_types } }));
        }
        if !request.path_prefixes.is_empty() {
            let prefixes: Vec<Value> = request
                .path_prefixes
                .iter()
                .map(|p| json!({ "prefix": { DIRNAME_FIELD: p } }))
                .collect();
            filters.push(json!({ "bool": { "should": prefixes, "minimum_should_match": 1 } }));
        }

        json!({
            "size": request.size,
            "_source": { "excludes": request.excluded_fields },
            "query": {
                "bool": {
                    "must": [ { "match": { "type": "Document" } }, text_query ],
                    "filter": filters
                }
            }
        })
    }
}

#[async_trait]
impl Indexer for ElasticsearchIndexer {
    async fn scroll(&self, request: ScrollRequest) -> Result<Box<dyn SearchCursor>, IndexError> {
        Ok(Box::new(ElasticsearchScroll {
            client: self.client.clone(),
            keep_alive: self.keep_alive.clone(),
            request,
            scroll_id: None,
            exhausted: false,
        }))
    }

    async fn close(&self) -> Result<(), IndexError> {
        debug!("closing index client for {}", self.client.base_url());
        Ok(())
    }
}

/// Scroll context of one request
struct ElasticsearchScroll {
    client: HttpClient,
    keep_alive: String,
    request: ScrollRequest,
    scroll_id: Option<String>,
    exhausted: bool,
}

impl ElasticsearchScroll {
    async fn fetch(&mut self) -> Result<ScrollResponse, IndexError> {
        let (endpoint, response) = match self.scroll_id {
            None => {
                let endpoint = format!("{}/_search", self.request.project);
                let body = ElasticsearchIndexer::search_body(&self.request);
                let response = self
                    .client
                    .send_json(
                        Method::POST,
                        &endpoint,
                        &[("scroll", self.keep_alive.as_str())],
                        &body,
                    )
                    .await?;
                (endpoint, response)
            }
            Some(ref scroll_id) => {
                let endpoint = "_search/scroll".to_string();
                let body = json!({ "scroll": self.keep_alive, "scroll_id": scroll_id });
                let response = self.client.send_json(Method::POST, &endpoint, &[], &body).await?;
                (endpoint, response)
            }
        };

        if !response.is_success() {
            return Err(status_error("POST", &endpoint, response));
        }
        response.json()
    }
}

#[async_trait]
impl SearchCursor for ElasticsearchScroll {
    async fn next_page(&mut self) -> Result<Vec<Document>, IndexError> {
        if self.exhausted {
            return Ok(Vec::new());
        }

        let page = self.fetch().await?;
        if page.hits.hits.is_empty() {
            self.exhausted = true;
        }
        match page.scroll_id {
            Some(scroll_id) => self.scroll_id = Some(scroll_id),
            // without an id the next call would restart the search
            None if !self.exhausted && self.scroll_id.is_none() => {
                return Err(IndexError::Decode(format!(
                    "missing _scroll_id in page of {} documents",
                    page.hits.hits.len()
                )));
            }
            None => {}
        }
        debug!(
            "scroll on {} for {:?} returned {} documents",
            self.request.project,
            self.request.query,
            page.hits.hits.len()
        );
        Ok(page.hits.hits.into_iter().map(Document::from).collect())
    }

    async fn clear(&mut self) -> Result<(), IndexError> {
        let Some(scroll_id) = self.scroll_id.take() else {
            return Ok(());
        };
        self.exhausted = true;

        let endpoint = "_search/scroll";
        let body = json!({ "scroll_id": [scroll_id] });
        let response = self.client.send_json(Method::DELETE, endpoint, &[], &body).await?;
        // a scroll that already expired is gone anyway
        if !response.is_success() && response.status != 404 {
            warn!("failed to clear scroll: HTTP {}", response.status);
            return Err(status_error("DELETE", endpoint, response));
        }
        Ok(())
    }
}

/// Turn an error response into a status error carrying the raw response
fn status_error(method: &str, endpoint: &str, response: HttpResponse) -> IndexError {
    let error = serde_json::from_str::<Value>(&response.text)
        .ok()
        .and_then(|body| body.get("error").cloned());
    let reason = match error {
        Some(Value::Object(ref err)) => format!(
            "Elasticsearch exception [type={}, reason={}]",
            err.get("type").and_then(Value::as_str).unwrap_or("unknown"),
            err.get("reason").and_then(Value::as_str).unwrap_or("unknown"),
        ),
        Some(Value::String(ref message)) => message.clone(),
        _ => format!("Unable to parse response body for HTTP {}", response.status),
    };

    IndexError::Status {
        status: response.status,
        reason,
        suppressed: vec![IndexError::Response(ResponseError {
            method: method.to_string(),
            endpoint: format!("/{}", endpoint.trim_start_matches('/')),
            status: response.status,
            body: response.text,
        })],
    }
}
