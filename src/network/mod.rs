//! Network module for the index REST API

mod client;

pub use client::{HttpClient, HttpResponse};
