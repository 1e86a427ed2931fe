//! Document index module
//!
//! Defines the scrolled search contract used by the batch runner and an
//! Elasticsearch implementation of it.

mod elasticsearch;
mod error;
mod traits;

pub use elasticsearch::{ElasticsearchIndexer, CONTENT_FIELD};
pub use error::{IndexError, ResponseError};
pub use traits::*;
