//! HTTP client for the index REST API

use crate::config::ElasticsearchSettings;
use crate::index::IndexError;
use anyhow::Result;
use reqwest::{Client, Method};
use std::time::Duration;
use url::Url;

/// Raw HTTP response from the index
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl HttpResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> std::result::Result<T, IndexError> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client wrapper bound to one index base URL
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a client for `address` with default settings
    pub fn new(address: &str) -> Result<Self> {
        Self::with_settings(&ElasticsearchSettings {
            address: address.to_string(),
            ..Default::default()
        })
    }

    /// Create a client with custom settings
    pub fn with_settings(settings: &ElasticsearchSettings) -> Result<Self> {
        if !(settings.request_timeout.is_finite() && settings.request_timeout > 0.0) {
            anyhow::bail!(
                "request_timeout must be a positive number of seconds, got {}",
                settings.request_timeout
            );
        }
        let timeout = Duration::try_from_secs_f64(settings.request_timeout)?;

        let mut builder = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        // Url::join drops the last segment of a base without trailing slash
        let mut address = settings.address.clone();
        if !address.ends_with('/') {
            address.push('/');
        }

        Ok(Self {
            client: builder.build()?,
            base_url: Url::parse(&address)?,
        })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a JSON request to `path` (relative to the base URL)
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> std::result::Result<HttpResponse, IndexError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| IndexError::Transport(format!("invalid path {}: {}", path, e)))?;

        let mut req_builder = self
            .client
            .request(method, url)
            .header("Accept", "application/json")
            .json(body);

        if !params.is_empty() {
            req_builder = req_builder.query(params);
        }

        let response = req_builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(HttpResponse { status, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new("http://localhost:9200");
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let client = HttpClient::new("http://localhost:9200/es").unwrap();
        let url = client.base_url().join("prj/_search").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/es/prj/_search");
    }

    #[test]
    fn test_invalid_request_timeout() {
        for request_timeout in [-1.0, 0.0, f64::NAN, f64::INFINITY] {
            let settings = ElasticsearchSettings {
                request_timeout,
                ..Default::default()
            };
            let err = HttpClient::with_settings(&settings).err().unwrap();
            assert!(err.to_string().contains("request_timeout"));
        }
    }

    #[test]
    fn test_invalid_address() {
        assert!(HttpClient::new("not a url").is_err());
    }
}
