//! Named tunables read by the batch runner

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use tracing::warn;

/// Delay in milliseconds between two scroll pages
pub const BATCH_SEARCH_THROTTLE: &str = "batchThrottleMilliseconds";
/// Time budget of one query in seconds
pub const BATCH_SEARCH_MAX_TIME: &str = "batchSearchMaxTime";
/// Requested scroll page size
pub const SCROLL_SIZE: &str = "scrollSize";

/// Key/value access to configuration
pub trait ConfigSource: Send + Sync {
    /// Raw value for `key`, if configured
    fn get(&self, key: &str) -> Option<String>;

    /// Parse `key`, falling back to `default` when absent or malformed
    fn get_or<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr,
        T::Err: Display,
        Self: Sized,
    {
        parse_or(self.get(key), key, default)
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Parse an optional raw value, logging and using `default` when it is invalid
pub fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => default,
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Invalid value {:?} for {}: {}, using default", value, key, e);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_get_or_default_when_missing() {
        let config = props(&[]);
        assert_eq!(config.get_or(BATCH_SEARCH_THROTTLE, 0u64), 0);
    }

    #[test]
    fn test_get_or_parses_value() {
        let config = props(&[(SCROLL_SIZE, " 200 ")]);
        assert_eq!(config.get_or(SCROLL_SIZE, 1000usize), 200);
    }

    #[test]
    fn test_get_or_malformed_value() {
        let config = props(&[(BATCH_SEARCH_MAX_TIME, "ten")]);
        assert_eq!(config.get_or(BATCH_SEARCH_MAX_TIME, 100_000u64), 100_000);
    }
}
