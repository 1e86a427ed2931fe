//! Settings structures for batchsearch-rs configuration

use super::properties::{
    ConfigSource, BATCH_SEARCH_MAX_TIME, BATCH_SEARCH_THROTTLE, SCROLL_SIZE,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure, read from `settings.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub elasticsearch: ElasticsearchSettings,
    pub batch: BatchSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (BATCHSEARCH_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars<F: Fn(&str) -> Option<String>>(&mut self, var: F) {
        if let Some(val) = var("BATCHSEARCH_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("BATCHSEARCH_USER") {
            self.general.default_user = val;
        }
        if let Some(val) = var("BATCHSEARCH_ELASTICSEARCH_ADDRESS") {
            self.elasticsearch.address = val;
        }
        if let Some(val) = var("BATCHSEARCH_THROTTLE_MS") {
            if let Ok(ms) = val.parse() {
                self.batch.throttle_ms = ms;
            }
        }
        if let Some(val) = var("BATCHSEARCH_MAX_TIME") {
            if let Ok(seconds) = val.parse() {
                self.batch.max_time_seconds = seconds;
            }
        }
        if let Some(val) = var("BATCHSEARCH_SCROLL_SIZE") {
            if let Ok(size) = val.parse() {
                self.batch.scroll_size = size;
            }
        }
    }
}

impl ConfigSource for Settings {
    fn get(&self, key: &str) -> Option<String> {
        match key {
            BATCH_SEARCH_THROTTLE => Some(self.batch.throttle_ms.to_string()),
            BATCH_SEARCH_MAX_TIME => Some(self.batch.max_time_seconds.to_string()),
            SCROLL_SIZE => Some(self.batch.scroll_size.to_string()),
            _ => None,
        }
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// User the command line runner works for
    pub default_user: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            default_user: "local".to_string(),
        }
    }
}

/// Connection settings for the Elasticsearch index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticsearchSettings {
    /// Base URL of the cluster
    pub address: String,
    /// Request timeout in seconds
    pub request_timeout: f64,
    /// How long the cluster keeps a scroll context alive between pages
    pub scroll_keep_alive: String,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for ElasticsearchSettings {
    fn default() -> Self {
        Self {
            address: "http://localhost:9200".to_string(),
            request_timeout: 30.0,
            scroll_keep_alive: "1m".to_string(),
            verify_ssl: true,
            pool_maxsize: 20,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Batch search runner tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Pause between two scroll pages
    pub throttle_ms: u64,
    /// Time budget of a single query, in seconds
    pub max_time_seconds: u64,
    /// Requested scroll page size (capped by the runner)
    pub scroll_size: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            throttle_ms: crate::DEFAULT_THROTTLE_MS,
            max_time_seconds: crate::DEFAULT_MAX_TIME_SECONDS,
            scroll_size: crate::DEFAULT_SCROLL_SIZE,
        }
    }
}
